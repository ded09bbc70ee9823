//! End-to-end lifecycle tests for the cistern drop ledger
//!
//! These tests run whole user journeys against one engine: funding a
//! balance through the deposit path, minting drops against it, moving
//! them between accounts, binding and destroying them, and finally
//! claiming the resource balance back out. Market reserves are pinned so
//! every byte and currency amount asserted here is exact.

use std::sync::Arc;

use cistern_core::{AccountId, CisternError, DropId, ManualClock};
use cistern_engine::{
    CisternConfig, CisternEngine, ClaimPayout, DepositOutcome, EffectRequest,
};
use cistern_market::FixedReserves;

const START: i64 = 1_700_000_000;
const ENTROPY: &str = "abcdefghijklmnopqrstuvwxyz012345";

// First three ids derived from ENTROPY at sequence 0.
const ID_A: u64 = 5760566682885896338;
const ID_B: u64 = 5171252045406531882;
const ID_C: u64 = 17722063587315666409;

fn account(name: &str) -> AccountId {
    AccountId::new(name).unwrap()
}

fn treasury() -> AccountId {
    account("cistern")
}

fn new_engine(config: CisternConfig) -> (CisternEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let engine = CisternEngine::new(
        config,
        Arc::new(FixedReserves::new(1_000_000, 500_000)),
        clock.clone(),
    )
    .expect("engine construction failed");
    engine.enable(&treasury(), true).expect("enable failed");
    (engine, clock)
}

/// Engine with alice opened and funded with exactly 2000 resource bytes.
///
/// At the pinned reserves a 1008 deposit buys 1999 bytes and a 2 deposit
/// buys one more, so two deposits land the balance on a round number.
fn funded_engine() -> (CisternEngine, AccountId) {
    let (engine, _clock) = new_engine(CisternConfig::default());
    let alice = account("alice");
    engine.open(&alice, &alice).expect("open failed");
    engine
        .deposit(&alice, &treasury(), 1008, "CST", "alice")
        .expect("first deposit failed");
    engine
        .deposit(&alice, &treasury(), 2, "CST", "alice")
        .expect("second deposit failed");
    engine.drain_effects();
    (engine, alice)
}

mod minting_tests {
    use super::*;

    #[test]
    fn test_deposit_then_generate_full_journey() {
        let (engine, _clock) = new_engine(CisternConfig::default());
        let alice = account("alice");
        engine.open(&alice, &alice).unwrap();

        // Fund with exactly 2000 bytes in two steps.
        let outcome = engine
            .deposit(&alice, &treasury(), 1008, "CST", "alice")
            .unwrap();
        assert_eq!(
            outcome,
            DepositOutcome::Credited {
                receiver: alice.clone(),
                bytes: 1999
            }
        );
        let outcome = engine
            .deposit(&alice, &treasury(), 2, "CST", "alice")
            .unwrap();
        assert_eq!(
            outcome,
            DepositOutcome::Credited {
                receiver: alice.clone(),
                bytes: 1
            }
        );
        assert_eq!(engine.balance_of(&alice).unwrap().resource_bytes, 2000);

        // Three unbound drops cost 831 bytes, quoted at 417 currency.
        assert_eq!(engine.quote_generate_cost(3).unwrap(), 417);
        let receipt = engine
            .generate(&alice, &alice, false, 3, ENTROPY, None)
            .unwrap();
        assert_eq!(
            receipt.ids,
            vec![DropId::new(ID_A), DropId::new(ID_B), DropId::new(ID_C)]
        );
        assert_eq!(receipt.bytes_charged, 831);
        assert_eq!(receipt.bytes_balance, 1169);

        let row = engine.balance_of(&alice).unwrap();
        assert_eq!(row.drops, 3);
        assert_eq!(row.resource_bytes, 1169);

        let record = engine.drop_record(DropId::new(ID_A)).unwrap();
        assert_eq!(record.owner, alice);
        assert_eq!(record.created_at, START);
        assert!(!record.bound);

        let stats = engine.stats();
        assert_eq!(stats.live_drops, 3);
        assert_eq!(stats.total_drops, 3);
        assert_eq!(stats.pooled_resource_bytes, 1169);
        assert_eq!(stats.sequence, 3);
    }

    #[test]
    fn test_owned_drops_listed_in_id_order() {
        let (engine, alice) = funded_engine();
        engine
            .generate(&alice, &alice, false, 3, ENTROPY, None)
            .unwrap();

        let ids: Vec<u64> = engine
            .drops_of(&alice)
            .iter()
            .map(|record| record.id.value())
            .collect();
        assert_eq!(ids, vec![ID_B, ID_A, ID_C]);
    }

    #[test]
    fn test_partial_funding_rejects_whole_batch() {
        let (engine, alice) = funded_engine();

        // 8 drops need 2216 bytes; alice holds 2000.
        let err = engine
            .generate(&alice, &alice, false, 8, ENTROPY, None)
            .unwrap_err();
        match err {
            CisternError::InsufficientBalance {
                required,
                available,
                ..
            } => {
                assert_eq!(required, 2216);
                assert_eq!(available, 2000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(engine.balance_of(&alice).unwrap().resource_bytes, 2000);
        assert_eq!(engine.stats().live_drops, 0);
        assert_eq!(engine.system_state().sequence, 0);
    }

    #[test]
    fn test_sequence_decorrelates_repeated_entropy() {
        let (engine, _clock) = new_engine(CisternConfig::default());
        let alice = account("alice");

        let first = engine
            .generate(&alice, &alice, true, 5, ENTROPY, None)
            .unwrap();
        let second = engine
            .generate(&alice, &alice, true, 1, ENTROPY, None)
            .unwrap();

        // Same entropy, different sequence window, different ids.
        assert_eq!(first.ids[0], DropId::new(ID_A));
        assert_eq!(second.ids[0], DropId::new(7572018407461188268));
        assert_eq!(engine.system_state().sequence, 6);
    }

    #[test]
    fn test_drop_records_pin_creation_time() {
        let (engine, clock) = new_engine(CisternConfig::default());
        let alice = account("alice");

        clock.advance(86_400);
        let receipt = engine
            .generate(&alice, &alice, true, 1, ENTROPY, None)
            .unwrap();
        let record = engine.drop_record(receipt.ids[0]).unwrap();
        assert_eq!(record.created_at, START + 86_400);
    }
}

mod transfer_tests {
    use super::*;

    #[test]
    fn test_transfer_moves_ownership_not_bytes() {
        let (engine, alice) = funded_engine();
        let bob = account("bob");
        let receipt = engine
            .generate(&alice, &alice, false, 2, ENTROPY, None)
            .unwrap();
        engine.drain_effects();

        engine
            .transfer(&alice, &alice, &bob, &receipt.ids, "for you")
            .unwrap();

        let alice_row = engine.balance_of(&alice).unwrap();
        assert_eq!(alice_row.drops, 0);
        assert_eq!(alice_row.resource_bytes, 1446);
        let bob_row = engine.balance_of(&bob).unwrap();
        assert_eq!(bob_row.drops, 2);
        assert_eq!(bob_row.resource_bytes, 0);

        for id in &receipt.ids {
            let record = engine.drop_record(*id).unwrap();
            assert_eq!(record.owner, bob);
            assert_eq!(record.created_at, START);
        }
        assert_eq!(engine.drops_of(&alice).len(), 0);
        assert_eq!(engine.drops_of(&bob).len(), 2);

        // Ownership moved, pool totals did not.
        let stats = engine.stats();
        assert_eq!(stats.total_drops, 2);
        assert_eq!(stats.pooled_resource_bytes, 1446);
        assert_eq!(
            engine.drain_effects(),
            vec![
                EffectRequest::Notify {
                    account: alice.clone()
                },
                EffectRequest::Notify { account: bob }
            ]
        );
    }

    #[test]
    fn test_bound_drop_poisons_whole_batch() {
        let (engine, alice) = funded_engine();
        let bob = account("bob");
        let receipt = engine
            .generate(&alice, &alice, false, 3, ENTROPY, None)
            .unwrap();
        engine.bind(&alice, &alice, &[receipt.ids[1]]).unwrap();
        engine.drain_effects();

        // One bound drop among two unbound ones sinks all three.
        let err = engine
            .transfer(&alice, &alice, &bob, &receipt.ids, "")
            .unwrap_err();
        assert!(matches!(err, CisternError::InvalidState(_)));

        // Nothing moved, bob was never opened.
        for id in &receipt.ids {
            assert_eq!(engine.drop_record(*id).unwrap().owner, alice);
        }
        let row = engine.balance_of(&alice).unwrap();
        assert_eq!(row.drops, 3);
        assert_eq!(row.resource_bytes, 1446);
        assert!(engine.balance_of(&bob).is_none());
        assert_eq!(engine.pending_effects(), 0);
    }

    #[test]
    fn test_transfer_rejects_self_and_treasury() {
        let (engine, alice) = funded_engine();
        let receipt = engine
            .generate(&alice, &alice, false, 1, ENTROPY, None)
            .unwrap();

        let err = engine
            .transfer(&alice, &alice, &alice, &receipt.ids, "")
            .unwrap_err();
        assert!(matches!(err, CisternError::InvalidInput(_)));

        let err = engine
            .transfer(&alice, &alice, &treasury(), &receipt.ids, "")
            .unwrap_err();
        assert!(matches!(err, CisternError::InvalidInput(_)));
    }
}

mod binding_tests {
    use super::*;

    #[test]
    fn test_bind_unbind_round_trip() {
        let (engine, alice) = funded_engine();
        let receipt = engine
            .generate(&alice, &alice, false, 3, ENTROPY, None)
            .unwrap();
        let pair = [receipt.ids[0], receipt.ids[1]];

        let bound = engine.bind(&alice, &alice, &pair).unwrap();
        assert_eq!(bound.bytes_released, 554);
        assert_eq!(bound.bytes_balance, 1723);
        assert!(engine.drop_record(pair[0]).unwrap().bound);
        assert!(engine.drop_record(pair[1]).unwrap().bound);
        assert!(!engine.drop_record(receipt.ids[2]).unwrap().bound);
        assert_eq!(engine.stats().pooled_resource_bytes, 1723);

        let unbound = engine.unbind(&alice, &alice, &pair).unwrap();
        assert_eq!(unbound.bytes_charged, 554);
        assert_eq!(unbound.bytes_balance, 1169);
        assert!(!engine.drop_record(pair[0]).unwrap().bound);
        assert_eq!(engine.stats().pooled_resource_bytes, 1169);
    }

    #[test]
    fn test_rebinding_and_double_unbind_rejected() {
        let (engine, alice) = funded_engine();
        let receipt = engine
            .generate(&alice, &alice, false, 1, ENTROPY, None)
            .unwrap();

        let err = engine.unbind(&alice, &alice, &receipt.ids).unwrap_err();
        assert!(matches!(err, CisternError::InvalidState(_)));

        engine.bind(&alice, &alice, &receipt.ids).unwrap();
        let err = engine.bind(&alice, &alice, &receipt.ids).unwrap_err();
        assert!(matches!(err, CisternError::InvalidState(_)));
    }

    #[test]
    fn test_unbind_requires_resource_headroom() {
        let (engine, _clock) = new_engine(CisternConfig::default());
        let alice = account("alice");
        let receipt = engine
            .generate(&alice, &alice, true, 3, ENTROPY, None)
            .unwrap();

        // Bound mints cost nothing, so alice holds zero bytes.
        let err = engine.unbind(&alice, &alice, &receipt.ids).unwrap_err();
        match err {
            CisternError::InsufficientBalance {
                required,
                available,
                ..
            } => {
                assert_eq!(required, 831);
                assert_eq!(available, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(engine.drop_record(receipt.ids[0]).unwrap().bound);
    }
}

mod destruction_tests {
    use super::*;

    #[test]
    fn test_destroy_reclaims_unbound_footprint() {
        let (engine, alice) = funded_engine();
        let receipt = engine
            .generate(&alice, &alice, false, 2, ENTROPY, None)
            .unwrap();
        engine.bind(&alice, &alice, &[receipt.ids[0]]).unwrap();

        // 1446 after minting, plus 277 released by the bind.
        assert_eq!(engine.balance_of(&alice).unwrap().resource_bytes, 1723);

        // Only the unbound drop's footprint comes back.
        let destroyed = engine
            .destroy(&alice, &alice, &receipt.ids, "cleanup", None)
            .unwrap();
        assert_eq!(destroyed.destroyed, 2);
        assert_eq!(destroyed.unbound_destroyed, 1);
        assert_eq!(destroyed.bytes_reclaimed, 277);

        let row = engine.balance_of(&alice).unwrap();
        assert_eq!(row.drops, 0);
        assert_eq!(row.resource_bytes, 2000);
        assert_eq!(engine.stats().live_drops, 0);
        assert_eq!(engine.stats().total_drops, 0);
        assert!(engine.drop_record(receipt.ids[0]).is_none());
        assert!(engine.drop_record(receipt.ids[1]).is_none());
    }

    #[test]
    fn test_destroying_foreign_drop_fails_whole_batch() {
        let (engine, alice) = funded_engine();
        let bob = account("bob");
        let hers = engine
            .generate(&alice, &alice, false, 1, ENTROPY, None)
            .unwrap();
        let his = engine
            .generate(&bob, &bob, true, 1, "zyxwvutsrqponmlkjihgfedcba543210", None)
            .unwrap();

        let err = engine
            .destroy(&alice, &alice, &[hers.ids[0], his.ids[0]], "", None)
            .unwrap_err();
        assert!(matches!(err, CisternError::NotOwner { .. }));
        assert!(engine.drop_record(hers.ids[0]).is_some());
        assert!(engine.drop_record(his.ids[0]).is_some());
        assert_eq!(engine.stats().live_drops, 2);
    }

    #[test]
    fn test_destroying_unknown_drop_fails() {
        let (engine, alice) = funded_engine();
        let receipt = engine
            .generate(&alice, &alice, false, 1, ENTROPY, None)
            .unwrap();

        let err = engine
            .destroy(
                &alice,
                &alice,
                &[receipt.ids[0], DropId::new(12345)],
                "",
                None,
            )
            .unwrap_err();
        assert!(matches!(err, CisternError::DropNotFound(_)));
        assert!(engine.drop_record(receipt.ids[0]).is_some());
    }
}

mod claim_tests {
    use super::*;

    #[test]
    fn test_claim_sells_balance_for_currency() {
        let (engine, alice) = funded_engine();
        engine
            .generate(&alice, &alice, false, 3, ENTROPY, None)
            .unwrap();
        engine.drain_effects();

        // 1169 bytes sell for 580 after the market fee.
        let receipt = engine.claim(&alice, &alice).unwrap();
        assert_eq!(receipt.bytes, 1169);
        assert_eq!(receipt.payout, ClaimPayout::Currency(580));

        assert_eq!(engine.balance_of(&alice).unwrap().resource_bytes, 0);
        assert_eq!(engine.stats().pooled_resource_bytes, 0);
        assert_eq!(
            engine.drain_effects(),
            vec![
                EffectRequest::SellResource { bytes: 1169 },
                EffectRequest::TransferCurrency {
                    to: alice,
                    amount: 580,
                    memo: "claimed resource balance".into()
                }
            ]
        );
    }

    #[test]
    fn test_claim_pays_raw_bytes_when_configured() {
        let (engine, _clock) = new_engine(CisternConfig {
            payout_in_resource: true,
            ..CisternConfig::default()
        });
        let alice = account("alice");
        engine.open(&alice, &alice).unwrap();
        engine
            .deposit(&alice, &treasury(), 1008, "CST", "alice")
            .unwrap();
        engine.drain_effects();

        let receipt = engine.claim(&alice, &alice).unwrap();
        assert_eq!(receipt.bytes, 1999);
        assert_eq!(receipt.payout, ClaimPayout::Resource(1999));
        assert_eq!(
            engine.drain_effects(),
            vec![EffectRequest::TransferResource {
                to: alice,
                bytes: 1999,
                memo: "claimed resource balance".into()
            }]
        );
    }
}

mod gating_tests {
    use super::*;

    #[test]
    fn test_kill_switch_blocks_lifecycle_but_not_exit() {
        let (engine, alice) = funded_engine();
        let bob = account("bob");
        let receipt = engine
            .generate(&alice, &alice, false, 1, ENTROPY, None)
            .unwrap();
        engine.drain_effects();

        engine.enable(&treasury(), false).unwrap();

        let err = engine
            .generate(&alice, &alice, false, 1, ENTROPY, None)
            .unwrap_err();
        assert!(matches!(err, CisternError::SystemDisabled));
        let err = engine
            .transfer(&alice, &alice, &bob, &receipt.ids, "")
            .unwrap_err();
        assert!(matches!(err, CisternError::SystemDisabled));
        let err = engine.bind(&alice, &alice, &receipt.ids).unwrap_err();
        assert!(matches!(err, CisternError::SystemDisabled));
        let err = engine.unbind(&alice, &alice, &receipt.ids).unwrap_err();
        assert!(matches!(err, CisternError::SystemDisabled));
        let err = engine
            .destroy(&alice, &alice, &receipt.ids, "", None)
            .unwrap_err();
        assert!(matches!(err, CisternError::SystemDisabled));
        let err = engine
            .deposit(&alice, &treasury(), 100, "CST", "alice")
            .unwrap_err();
        assert!(matches!(err, CisternError::SystemDisabled));

        // Exits stay open: new rows and withdrawals still work.
        assert!(engine.open(&bob, &bob).unwrap());
        let claim = engine.claim(&alice, &alice).unwrap();
        assert_eq!(claim.bytes, 1723);
        assert!(matches!(claim.payout, ClaimPayout::Currency(_)));

        // Re-enabling resumes minting.
        engine.enable(&treasury(), true).unwrap();
        engine
            .generate(&alice, &alice, true, 1, ENTROPY, None)
            .unwrap();
    }
}

mod effect_tests {
    use super::*;

    #[test]
    fn test_effects_drain_in_emission_order() {
        let (engine, _clock) = new_engine(CisternConfig::default());
        let alice = account("alice");
        let bob = account("bob");
        engine.open(&alice, &alice).unwrap();

        engine
            .deposit(&alice, &treasury(), 1008, "CST", "alice")
            .unwrap();
        let receipt = engine
            .generate(&alice, &alice, false, 1, ENTROPY, None)
            .unwrap();
        engine
            .transfer(&alice, &alice, &bob, &receipt.ids, "")
            .unwrap();

        assert_eq!(
            engine.drain_effects(),
            vec![
                EffectRequest::BuyResource { cost: 1008 },
                EffectRequest::Notify {
                    account: alice.clone()
                },
                EffectRequest::Notify {
                    account: alice.clone()
                },
                EffectRequest::Notify {
                    account: bob.clone()
                }
            ]
        );
        assert_eq!(engine.pending_effects(), 0);
        assert!(engine.drain_effects().is_empty());
    }

    #[test]
    fn test_generate_notifies_requested_account() {
        let (engine, _clock) = new_engine(CisternConfig::default());
        let alice = account("alice");
        let charlie = account("charlie");

        engine
            .generate(&alice, &alice, true, 1, ENTROPY, Some(&charlie))
            .unwrap();
        assert_eq!(
            engine.drain_effects(),
            vec![
                EffectRequest::Notify {
                    account: alice.clone()
                },
                EffectRequest::Notify { account: charlie }
            ]
        );
    }
}

mod supply_tests {
    use super::*;

    #[test]
    fn test_treasury_mirrors_user_totals() {
        let (engine, alice) = funded_engine();
        let bob = account("bob");
        engine.open(&bob, &bob).unwrap();
        engine
            .deposit(&bob, &treasury(), 1008, "CST", "bob")
            .unwrap();

        engine
            .generate(&alice, &alice, false, 3, ENTROPY, None)
            .unwrap();
        engine
            .generate(&bob, &bob, false, 2, "zyxwvutsrqponmlkjihgfedcba543210", None)
            .unwrap();
        let hers = engine.drops_of(&alice);
        engine
            .transfer(&alice, &alice, &bob, &[hers[0].id], "")
            .unwrap();
        engine
            .destroy(&alice, &alice, &[hers[1].id], "", None)
            .unwrap();

        let alice_row = engine.balance_of(&alice).unwrap();
        let bob_row = engine.balance_of(&bob).unwrap();
        assert_eq!(alice_row.drops, 1);
        assert_eq!(bob_row.drops, 3);
        assert_eq!(alice_row.resource_bytes, 1446);
        assert_eq!(bob_row.resource_bytes, 1445);

        // The treasury row always carries the user sums.
        let stats = engine.stats();
        assert_eq!(stats.live_drops, 4);
        assert_eq!(stats.total_drops, alice_row.drops + bob_row.drops);
        assert_eq!(
            stats.pooled_resource_bytes,
            alice_row.resource_bytes + bob_row.resource_bytes
        );
        assert_eq!(stats.accounts, 3);
    }
}
