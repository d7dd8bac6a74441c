//! Integration tests for the reservation engine on the in-memory store.
//!
//! Covers the reservation lifecycle end to end, concurrent reservations
//! against shared SKUs, and low-stock pagination.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::thread;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use stockhold_core::{ErrorKind, FixedClock, ReservationId, Sku};
    use stockhold_inventory::{
        CommitReservation, ConfigureSafetyStock, LowStockQuery, NewReservation, ReleaseReservation,
        ReservationLine, ReservationStatus, StockRecord,
    };

    use crate::config::EngineConfig;
    use crate::engine::InventoryEngine;
    use crate::store::{CallContext, CancelHandle, InMemoryStore};

    type Engine = InventoryEngine<InMemoryStore, Arc<FixedClock>>;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn ctx() -> CallContext {
        CallContext::background()
    }

    fn setup_with(config: EngineConfig) -> (Engine, Arc<FixedClock>) {
        stockhold_observability::init_for_tests();
        let clock = Arc::new(FixedClock::new(t0()));
        let engine = InventoryEngine::new(InMemoryStore::from_config(&config), clock.clone())
            .with_config(config);
        (engine, clock)
    }

    fn setup() -> (Engine, Arc<FixedClock>) {
        setup_with(EngineConfig::default())
    }

    fn stock_sku(engine: &Engine, sku: &str, on_hand: i64, safety: i64) -> StockRecord {
        engine
            .configure_safety_stock(
                &ctx(),
                ConfigureSafetyStock::new(sku, safety)
                    .with_product_ref(format!("prod-{sku}"))
                    .with_initial_on_hand(on_hand),
            )
            .unwrap()
    }

    fn reserve(id: &str, lines: &[(&str, i64)]) -> NewReservation {
        NewReservation::new(
            id,
            lines
                .iter()
                .map(|(sku, qty)| ReservationLine::new(format!("prod-{sku}"), *sku, *qty))
                .collect(),
        )
        .with_order_ref(format!("order-{id}"))
        .with_user_ref("user-1")
    }

    fn ledger(engine: &Engine, sku: &str) -> (i64, i64) {
        let s = engine.get_stock(&Sku::new(sku)).unwrap();
        (s.on_hand(), s.reserved())
    }

    #[test]
    fn reserve_commit_reserve_release_lifecycle() {
        let (engine, clock) = setup();
        stock_sku(&engine, "A", 5, 2);

        let r1 = engine.reserve(&ctx(), reserve("r1", &[("A", 3)])).unwrap();
        let a = r1.stock("A").unwrap();
        assert_eq!((a.reserved(), a.available()), (3, 2));
        assert_eq!(r1.reservation.status(), ReservationStatus::Reserved);

        let err = engine.reserve(&ctx(), reserve("r2", &[("A", 3)])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        clock.advance(Duration::minutes(1));
        let committed = engine.commit(&ctx(), CommitReservation::new("r1")).unwrap();
        assert_eq!(ledger(&engine, "A"), (2, 0));
        assert_eq!(committed.reservation.status(), ReservationStatus::Committed);
        assert_eq!(committed.reservation.committed_at(), Some(t0() + Duration::minutes(1)));

        engine.reserve(&ctx(), reserve("r2", &[("A", 2)])).unwrap();
        let released = engine
            .release(&ctx(), ReleaseReservation::new("r2").with_reason("cancelled"))
            .unwrap();
        assert_eq!(ledger(&engine, "A"), (2, 0));
        assert_eq!(released.reservation.status(), ReservationStatus::Released);
        assert_eq!(released.reservation.reason(), Some("cancelled"));

        let stored = engine.get_reservation(&ReservationId::new("r2")).unwrap();
        assert_eq!(stored, released.reservation);
    }

    #[test]
    fn duplicate_reservation_id_is_rejected() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 0);

        engine.reserve(&ctx(), reserve("dup", &[("A", 1)])).unwrap();
        let err = engine.reserve(&ctx(), reserve("dup", &[("A", 1)])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReservationState);
        assert_eq!(ledger(&engine, "A"), (10, 1));
    }

    #[test]
    fn configure_creates_missing_sku() {
        let (engine, _) = setup();
        let b = engine
            .configure_safety_stock(&ctx(), ConfigureSafetyStock::new("B", 8).with_initial_on_hand(0))
            .unwrap();
        assert_eq!((b.on_hand(), b.reserved(), b.safety_stock()), (0, 0, 8));
        assert_eq!(b.safety_delta(), -8);
        assert_eq!(b.updated_at(), t0());
        assert_eq!(engine.get_stock(&Sku::new("B")).unwrap(), b);
    }

    #[test]
    fn configure_keeps_reserved_and_guards_on_hand() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 1);
        engine.reserve(&ctx(), reserve("r1", &[("A", 6)])).unwrap();

        let a = engine
            .configure_safety_stock(&ctx(), ConfigureSafetyStock::new("A", 3))
            .unwrap();
        assert_eq!((a.on_hand(), a.reserved(), a.safety_stock()), (10, 6, 3));
        assert_eq!(a.product_ref(), "prod-A");

        let err = engine
            .configure_safety_stock(&ctx(), ConfigureSafetyStock::new("A", 3).with_initial_on_hand(5))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(ledger(&engine, "A"), (10, 6));

        let err = engine
            .configure_safety_stock(&ctx(), ConfigureSafetyStock::new("A", -1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn reserve_is_all_or_nothing() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 0);
        stock_sku(&engine, "B", 1, 0);

        let err = engine
            .reserve(&ctx(), reserve("r1", &[("A", 4), ("B", 2)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        let err = engine
            .reserve(&ctx(), reserve("r2", &[("A", 4), ("MISSING", 1)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StockNotFound);

        assert_eq!(ledger(&engine, "A"), (10, 0));
        assert_eq!(ledger(&engine, "B"), (1, 0));
        for id in ["r1", "r2"] {
            let err = engine.get_reservation(&ReservationId::new(id)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ReservationNotFound);
        }
    }

    #[test]
    fn malformed_requests_are_invalid_input() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 0);

        let cases = [
            reserve("", &[("A", 1)]),
            reserve("r1", &[]),
            reserve("r1", &[("A", 0)]),
            reserve("r1", &[("A", -2)]),
            reserve("r1", &[("", 1)]),
        ];
        for request in cases {
            let err = engine.reserve(&ctx(), request).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert_eq!(ledger(&engine, "A"), (10, 0));
    }

    #[test]
    fn repeated_lines_for_one_sku_accumulate() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 5, 0);

        let outcome = engine
            .reserve(&ctx(), reserve("r1", &[("A", 2), ("A", 2)]))
            .unwrap();
        assert_eq!(outcome.stocks.len(), 1);
        assert_eq!(outcome.stock("A").unwrap().reserved(), 4);

        let err = engine
            .reserve(&ctx(), reserve("r2", &[("A", 1), ("A", 1)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(ledger(&engine, "A"), (5, 4));
    }

    #[test]
    fn commit_consumes_and_release_returns_across_skus() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 0);
        stock_sku(&engine, "B", 7, 0);

        engine.reserve(&ctx(), reserve("c", &[("A", 3), ("B", 2)])).unwrap();
        engine.reserve(&ctx(), reserve("r", &[("A", 1), ("B", 4)])).unwrap();
        assert_eq!(ledger(&engine, "A"), (10, 4));
        assert_eq!(ledger(&engine, "B"), (7, 6));

        let committed = engine
            .commit(&ctx(), CommitReservation::new("c").with_order_ref("order-c"))
            .unwrap();
        assert_eq!(ledger(&engine, "A"), (7, 1));
        assert_eq!(ledger(&engine, "B"), (5, 4));
        assert_eq!(committed.stocks.len(), 2);

        engine.release(&ctx(), ReleaseReservation::new("r")).unwrap();
        assert_eq!(ledger(&engine, "A"), (7, 0));
        assert_eq!(ledger(&engine, "B"), (5, 0));
    }

    #[test]
    fn terminal_reservations_reject_further_settlement() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 0);
        engine.reserve(&ctx(), reserve("c", &[("A", 2)])).unwrap();
        engine.reserve(&ctx(), reserve("r", &[("A", 3)])).unwrap();
        engine.commit(&ctx(), CommitReservation::new("c")).unwrap();
        engine.release(&ctx(), ReleaseReservation::new("r")).unwrap();
        let before = ledger(&engine, "A");

        for id in ["c", "r"] {
            let err = engine.commit(&ctx(), CommitReservation::new(id)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidReservationState);
            let err = engine.release(&ctx(), ReleaseReservation::new(id)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidReservationState);
        }
        assert_eq!(ledger(&engine, "A"), before);
        assert_eq!(before, (8, 0));
    }

    #[test]
    fn unknown_reservations_and_order_mismatch() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 0);

        let err = engine.commit(&ctx(), CommitReservation::new("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReservationNotFound);
        let err = engine.release(&ctx(), ReleaseReservation::new("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReservationNotFound);
        let err = engine.get_stock(&Sku::new("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StockNotFound);

        engine.reserve(&ctx(), reserve("r1", &[("A", 2)])).unwrap();
        let err = engine
            .commit(&ctx(), CommitReservation::new("r1").with_order_ref("someone-else"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReservationState);
        assert_eq!(ledger(&engine, "A"), (10, 2));
        assert_eq!(
            engine.get_reservation(&ReservationId::new("r1")).unwrap().status(),
            ReservationStatus::Reserved
        );
    }

    #[test]
    fn blank_order_ref_and_reason_count_as_absent() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 0);
        engine.reserve(&ctx(), reserve("c", &[("A", 2)])).unwrap();
        engine.reserve(&ctx(), reserve("r", &[("A", 3)])).unwrap();

        let committed = engine
            .commit(&ctx(), CommitReservation::new("c").with_order_ref(""))
            .unwrap();
        assert_eq!(committed.reservation.status(), ReservationStatus::Committed);

        let released = engine
            .release(&ctx(), ReleaseReservation::new("r").with_reason(""))
            .unwrap();
        assert_eq!(released.reservation.reason(), None);
        assert_eq!(ledger(&engine, "A"), (8, 0));
    }

    #[test]
    fn reservation_metadata_is_persisted() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 0);
        let created = t0() - Duration::hours(2);
        let expires = t0() + Duration::minutes(15);

        let request = reserve("r1", &[("A", 1)])
            .with_idempotency_key("idem-1")
            .with_expires_at(expires)
            .with_created_at(created);
        let outcome = engine.reserve(&ctx(), request).unwrap();

        let r = engine.get_reservation(&ReservationId::new("r1")).unwrap();
        assert_eq!(r, outcome.reservation);
        assert_eq!(r.idempotency_key(), Some("idem-1"));
        assert_eq!(r.expires_at(), Some(expires));
        assert_eq!(r.created_at(), created);
        assert_eq!(r.updated_at(), t0());
        assert_eq!(r.user_ref(), "user-1");
        assert_eq!(r.order_ref(), "order-r1");
    }

    #[test]
    fn expired_reservations_are_listed_not_released() {
        let (engine, clock) = setup();
        stock_sku(&engine, "A", 10, 0);

        engine
            .reserve(&ctx(), reserve("late", &[("A", 1)]).with_expires_at(t0() + Duration::minutes(10)))
            .unwrap();
        engine
            .reserve(&ctx(), reserve("early", &[("A", 1)]).with_expires_at(t0() + Duration::minutes(5)))
            .unwrap();
        engine.reserve(&ctx(), reserve("open", &[("A", 1)])).unwrap();
        engine
            .reserve(&ctx(), reserve("done", &[("A", 1)]).with_expires_at(t0()))
            .unwrap();
        engine.commit(&ctx(), CommitReservation::new("done")).unwrap();

        assert!(engine.list_expired_reservations(None).unwrap().is_empty());

        clock.advance(Duration::minutes(10));
        let ids: Vec<_> = engine
            .list_expired_reservations(None)
            .unwrap()
            .into_iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, ["early", "late"]);
        assert_eq!(engine.list_expired_reservations(Some(1)).unwrap().len(), 1);
        assert_eq!(ledger(&engine, "A"), (9, 3));
    }

    #[test]
    fn cancelled_calls_leave_no_trace() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 10, 0);

        let handle = CancelHandle::new();
        handle.cancel();
        let cancelled = CallContext::background().with_cancel(handle);
        let err = engine
            .reserve(&cancelled, reserve("r1", &[("A", 1)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);

        let expired = CallContext::background().with_deadline(std::time::Instant::now());
        let err = engine
            .configure_safety_stock(&expired, ConfigureSafetyStock::new("A", 1).with_initial_on_hand(99))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);

        assert_eq!(ledger(&engine, "A"), (10, 0));
        assert!(engine.get_reservation(&ReservationId::new("r1")).is_err());
    }

    #[test]
    fn concurrent_reservations_never_oversell() {
        let (engine, _) = setup_with(EngineConfig::default().with_max_txn_attempts(10_000));
        stock_sku(&engine, "HOT", 100, 0);
        let engine = Arc::new(engine);

        let handles: Vec<_> = (0..16)
            .map(|worker| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    let mut reserved = 0;
                    for n in 0..10 {
                        let id = format!("w{worker}-{n}");
                        match engine.reserve(&CallContext::background(), reserve(&id, &[("HOT", 3)])) {
                            Ok(outcome) => {
                                let hot = outcome.stock("HOT").unwrap();
                                assert!(hot.reserved() <= hot.on_hand());
                                reserved += 3;
                            }
                            Err(e) => assert_eq!(e.kind(), ErrorKind::InsufficientStock),
                        }
                    }
                    reserved
                })
            })
            .collect();

        let total: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 99);
        assert_eq!(ledger(&engine, "HOT"), (100, 99));
    }

    #[test]
    fn concurrent_commit_and_release_race_has_one_winner() {
        for round in 0..20 {
            let (engine, _) = setup();
            stock_sku(&engine, "A", 10, 0);
            let id = format!("race-{round}");
            engine.reserve(&ctx(), reserve(&id, &[("A", 4)])).unwrap();
            let engine = Arc::new(engine);

            let committer = {
                let engine = Arc::clone(&engine);
                let id = id.clone();
                thread::spawn(move || engine.commit(&CallContext::background(), CommitReservation::new(id)))
            };
            let releaser = {
                let engine = Arc::clone(&engine);
                let id = id.clone();
                thread::spawn(move || engine.release(&CallContext::background(), ReleaseReservation::new(id)))
            };

            let committed = committer.join().unwrap();
            let released = releaser.join().unwrap();
            assert!(committed.is_ok() != released.is_ok());

            let status = engine.get_reservation(&ReservationId::new(id)).unwrap().status();
            if committed.is_ok() {
                assert_eq!(status, ReservationStatus::Committed);
                assert_eq!(ledger(&engine, "A"), (6, 0));
            } else {
                assert_eq!(released.unwrap_err().kind(), ErrorKind::InvalidReservationState);
                assert_eq!(status, ReservationStatus::Released);
                assert_eq!(ledger(&engine, "A"), (10, 0));
            }
        }
    }

    fn drain_low_stock(engine: &Engine, query: LowStockQuery) -> Vec<String> {
        let mut seen = Vec::new();
        let mut query = query;
        loop {
            let page = engine.list_low_stock(&query).unwrap();
            seen.extend(page.items.iter().map(|r| r.sku().to_string()));
            match page.next_page_token {
                Some(token) => query = query.with_page_token(token),
                None => return seen,
            }
        }
    }

    #[test]
    fn low_stock_default_path_orders_by_safety_delta() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 1, 5); // -4
        stock_sku(&engine, "B", 4, 5); // -1
        stock_sku(&engine, "C", 0, 4); // -4
        stock_sku(&engine, "D", 9, 5); // not low
        stock_sku(&engine, "E", 5, 5); // zero delta, not low

        let page = engine.list_low_stock(&LowStockQuery::below_safety_stock()).unwrap();
        let skus: Vec<_> = page.items.iter().map(|r| r.sku().as_str()).collect();
        assert_eq!(skus, ["A", "C", "B"]);
        assert!(page.next_page_token.is_none());

        engine.reserve(&ctx(), reserve("r1", &[("D", 5)])).unwrap(); // D: -1
        let skus = drain_low_stock(&engine, LowStockQuery::below_safety_stock().with_page_size(1));
        assert_eq!(skus, ["A", "C", "B", "D"]);
    }

    #[test]
    fn low_stock_threshold_path_orders_by_available() {
        let (engine, _) = setup();
        stock_sku(&engine, "A", 3, 0);
        stock_sku(&engine, "B", 1, 0);
        stock_sku(&engine, "C", 8, 0);
        stock_sku(&engine, "D", 3, 100);
        engine.reserve(&ctx(), reserve("r1", &[("C", 6)])).unwrap();

        let skus = drain_low_stock(&engine, LowStockQuery::at_or_below(3).with_page_size(2));
        assert_eq!(skus, ["B", "C", "A", "D"]);
    }

    #[test]
    fn low_stock_cursor_survives_concurrent_inserts_ahead_of_it() {
        let (engine, _) = setup();
        for (i, sku) in ["K1", "K2", "K3", "K4"].iter().enumerate() {
            stock_sku(&engine, sku, 0, 10 + i as i64);
        }

        let first = engine
            .list_low_stock(&LowStockQuery::below_safety_stock().with_page_size(2))
            .unwrap();
        let first_skus: Vec<_> = first.items.iter().map(|r| r.sku().to_string()).collect();
        assert_eq!(first_skus, ["K4", "K3"]);

        // Sorts before the cursor; an offset-based scan would now repeat K3.
        stock_sku(&engine, "K0", 0, 50);

        let token = first.next_page_token.unwrap();
        let second = engine
            .list_low_stock(
                &LowStockQuery::below_safety_stock()
                    .with_page_size(2)
                    .with_page_token(token),
            )
            .unwrap();
        let second_skus: Vec<_> = second.items.iter().map(|r| r.sku().to_string()).collect();
        assert_eq!(second_skus, ["K2", "K1"]);
        assert!(second.next_page_token.is_none());
    }

    #[test]
    fn low_stock_rejects_malformed_tokens_and_clamps_page_size() {
        let (engine, _) = setup();
        for i in 0..205 {
            stock_sku(&engine, &format!("S{i:03}"), 0, 1);
        }

        let err = engine
            .list_low_stock(&LowStockQuery::below_safety_stock().with_page_token("%%%"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let page = engine.list_low_stock(&LowStockQuery::below_safety_stock()).unwrap();
        assert_eq!(page.items.len(), 50);
        let page = engine
            .list_low_stock(&LowStockQuery::below_safety_stock().with_page_size(10_000))
            .unwrap();
        assert_eq!(page.items.len(), 200);
        assert!(page.next_page_token.is_some());

        let page = engine
            .list_low_stock(&LowStockQuery::below_safety_stock().with_page_token(""))
            .unwrap();
        assert_eq!(page.items[0].sku().as_str(), "S000");
    }

    #[test]
    fn unbounded_page_size_does_not_overflow_the_scan_limit() {
        let (engine, _) = setup_with(EngineConfig::default().with_max_page_size(usize::MAX));
        stock_sku(&engine, "A", 0, 3);
        stock_sku(&engine, "B", 1, 3);

        let page = engine
            .list_low_stock(&LowStockQuery::below_safety_stock().with_page_size(usize::MAX))
            .unwrap();
        let skus: Vec<_> = page.items.iter().map(|r| r.sku().as_str()).collect();
        assert_eq!(skus, ["A", "B"]);
        assert!(page.next_page_token.is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 48,
            ..ProptestConfig::default()
        })]

        /// Property: commit lowers on_hand and reserved by the committed quantities,
        /// release lowers only reserved, and reserved never exceeds on_hand.
        #[test]
        fn settlement_arithmetic_matches_model(
            on_hand in 0i64..60,
            orders in prop::collection::vec((1i64..8, 0u8..3), 1..20),
        ) {
            let (engine, _) = setup();
            stock_sku(&engine, "A", on_hand, 0);
            let (mut model_on_hand, mut model_reserved) = (on_hand, 0i64);

            for (i, (qty, action)) in orders.iter().enumerate() {
                let id = format!("p{i}");
                match engine.reserve(&ctx(), reserve(&id, &[("A", *qty)])) {
                    Ok(_) => model_reserved += qty,
                    Err(e) => {
                        prop_assert_eq!(e.kind(), ErrorKind::InsufficientStock);
                        prop_assert!(model_on_hand - model_reserved < *qty);
                        continue;
                    }
                }
                match action {
                    0 => {
                        engine.commit(&ctx(), CommitReservation::new(id.as_str())).unwrap();
                        model_on_hand -= qty;
                        model_reserved -= qty;
                    }
                    1 => {
                        engine.release(&ctx(), ReleaseReservation::new(id.as_str())).unwrap();
                        model_reserved -= qty;
                    }
                    _ => {}
                }
                let (actual_on_hand, actual_reserved) = ledger(&engine, "A");
                prop_assert_eq!((actual_on_hand, actual_reserved), (model_on_hand, model_reserved));
                prop_assert!(actual_reserved <= actual_on_hand);
            }
        }

        /// Property: draining the default low-stock path yields exactly the records
        /// with a negative safety delta, each once, for any page size.
        #[test]
        fn low_stock_pagination_is_complete(
            ledgers in prop::collection::vec((0i64..15, 0i64..15), 1..40),
            page_size in 1usize..9,
        ) {
            let (engine, _) = setup();
            let mut expected = BTreeSet::new();
            for (i, (on_hand, safety)) in ledgers.iter().enumerate() {
                let record = stock_sku(&engine, &format!("SKU-{i:02}"), *on_hand, *safety);
                if record.safety_delta() < 0 {
                    expected.insert(record.sku().to_string());
                }
            }

            let seen = drain_low_stock(&engine, LowStockQuery::below_safety_stock().with_page_size(page_size));
            prop_assert_eq!(seen.len(), expected.len());
            prop_assert_eq!(seen.into_iter().collect::<BTreeSet<_>>(), expected);
        }
    }
}
