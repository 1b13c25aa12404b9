// guarded_batch.rs — Guarded batches against a live registry.
//
// Sets up one custodial wallet with a USDC balance, a registry that
// whitelists USDC transfer/approve and a lending pool's supply function, and
// an executor pointing at that registry. Then checks:
//
//   - whitelisted calls go through and move balances
//   - unauthorized recipients and spenders stop the batch
//   - a non-whitelisted entry anywhere rolls back the whole batch
//   - validation and dispatch interleave in batch order
//   - pause, registry pointer swaps and recipient scopes behave as configured

use std::collections::HashMap;
use std::sync::Arc;

use vg_audit::{GuardEvent, MemorySink};
use vg_core::{Address, Execution, ManualClock, PauseError, Selector, StaticOwners, U256};
use vg_executor::calldata::{encode_approve, encode_transfer, encode_transfer_from, APPROVE, TRANSFER};
use vg_executor::{
    AccountRuntime, CalldataError, ExecutorError, ForwardError, GuardedExecutor, SimulatedAccount,
};
use vg_registry::{RecipientScope, RegistryConfig, WhitelistRegistry};

const SUPPLY_ID: Selector = Selector::new([0x61, 0x7b, 0xa0, 0x37]);
const NOW: u64 = 1_700_000_000;

fn addr(byte: u8) -> Address {
    Address::with_last_byte(byte)
}

fn admin() -> Address {
    addr(0xA0)
}
fn wallet() -> Address {
    addr(0x20)
}
fn wallet_owner() -> Address {
    addr(0x21)
}
fn attacker() -> Address {
    addr(0x66)
}
fn usdc() -> Address {
    addr(0x10)
}
fn pool_a() -> Address {
    addr(0xA1)
}
fn pool_b() -> Address {
    addr(0xB2)
}
fn registry_address() -> Address {
    addr(0xEE)
}

fn registry_with(config: RegistryConfig) -> WhitelistRegistry {
    let mut registry = WhitelistRegistry::new(registry_address(), admin(), config).with_owner_query(
        Arc::new(StaticOwners::new().with_wallet(wallet(), [wallet_owner()])),
    );
    registry
        .add_entries(
            admin(),
            &[usdc(), usdc(), pool_a()],
            &[TRANSFER, APPROVE, SUPPLY_ID],
        )
        .unwrap();
    registry
}

fn registry() -> WhitelistRegistry {
    registry_with(RegistryConfig::immediate())
}

fn account() -> SimulatedAccount {
    SimulatedAccount::new().with_balance(usdc(), wallet(), U256::from(1_000))
}

fn executor(sink: Arc<MemorySink>) -> GuardedExecutor {
    GuardedExecutor::new(addr(0xEC), admin(), registry_address())
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(NOW)))
        .with_sink(sink)
}

fn transfer(to: Address, amount: u64) -> Execution {
    Execution::call(usdc(), encode_transfer(to, U256::from(amount)))
}

fn supply(pool: Address) -> Execution {
    let mut payload = SUPPLY_ID.to_vec();
    payload.extend_from_slice(&[0u8; 64]);
    Execution::call(pool, payload)
}

#[test]
fn whitelisted_transfer_to_wallet_owner_succeeds() {
    let sink = Arc::new(MemorySink::new());
    let executor = executor(sink.clone());
    let registry = registry();
    let mut account = account();

    let receipt = executor
        .execute_guarded_batch(
            wallet(),
            &[transfer(wallet_owner(), 100), supply(pool_a())],
            &registry,
            &mut account,
        )
        .unwrap();

    assert_eq!(receipt.executor, wallet());
    assert_eq!(receipt.targets, vec![usdc(), pool_a()]);
    assert_eq!(receipt.selectors, vec![TRANSFER, SUPPLY_ID]);
    assert_eq!(receipt.timestamp, NOW);
    assert_eq!(account.balance_of(usdc(), wallet()), U256::from(900));
    assert_eq!(account.balance_of(usdc(), wallet_owner()), U256::from(100));

    // Calls ran as the custodial account, in order.
    let calls = account.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.account == wallet()));
    assert_eq!(calls[1].target, pool_a());

    match &sink.events()[..] {
        [GuardEvent::BatchExecuted {
            executor,
            targets,
            selectors,
            timestamp,
        }] => {
            assert_eq!(*executor, wallet());
            assert_eq!(targets, &receipt.targets);
            assert_eq!(selectors, &receipt.selectors);
            assert_eq!(*timestamp, NOW);
        }
        other => panic!("unexpected events: {:?}", other),
    }
}

#[test]
fn transfer_to_attacker_is_unauthorized() {
    let sink = Arc::new(MemorySink::new());
    let executor = executor(sink.clone());
    let mut account = account();

    let result = executor.execute_guarded_batch(
        wallet(),
        &[transfer(attacker(), 100)],
        &registry(),
        &mut account,
    );

    match result {
        Err(ExecutorError::UnauthorizedTransfer {
            index,
            token,
            recipient,
        }) => {
            assert_eq!(index, 0);
            assert_eq!(token, usdc());
            assert_eq!(recipient, attacker());
        }
        other => panic!("expected UnauthorizedTransfer, got {:?}", other),
    }
    assert_eq!(account.balance_of(usdc(), wallet()), U256::from(1_000));
    assert!(account.calls().is_empty());
    assert!(sink.is_empty());
}

#[test]
fn non_whitelisted_entry_rolls_back_earlier_calls() {
    let sink = Arc::new(MemorySink::new());
    let executor = executor(sink.clone());
    let mut account = account();

    let result = executor.execute_guarded_batch(
        wallet(),
        &[transfer(wallet(), 10), supply(pool_a()), supply(pool_b())],
        &registry(),
        &mut account,
    );

    assert!(matches!(
        result,
        Err(ExecutorError::NotWhitelisted { index: 2, target, selector })
            if target == pool_b() && selector == SUPPLY_ID
    ));
    assert!(account.calls().is_empty());
    assert_eq!(account.balance_of(usdc(), wallet()), U256::from(1_000));
    assert!(sink.is_empty());
}

#[test]
fn dispatch_is_interleaved_with_validation() {
    let executor = executor(Arc::new(MemorySink::new()));
    let mut account = account().with_reverting_target(pool_a());

    // Entry 0 is forwarded (and reverts) before entry 1 is ever checked.
    let result = executor.execute_guarded_batch(
        wallet(),
        &[supply(pool_a()), supply(pool_b())],
        &registry(),
        &mut account,
    );
    assert!(matches!(
        result,
        Err(ExecutorError::CallFailed {
            index: 0,
            source: ForwardError::Reverted { .. }
        })
    ));
}

#[test]
fn empty_batch_rejected() {
    let executor = executor(Arc::new(MemorySink::new()));
    assert!(matches!(
        executor.execute_guarded_batch(wallet(), &[], &registry(), &mut account()),
        Err(ExecutorError::EmptyBatch)
    ));
}

#[test]
fn malformed_payloads_are_invalid_calldata() {
    let executor = executor(Arc::new(MemorySink::new()));
    let registry = registry();

    let short = Execution::call(usdc(), vec![0xa9u8, 0x05]);
    assert!(matches!(
        executor.execute_guarded_batch(wallet(), &[short], &registry, &mut account()),
        Err(ExecutorError::InvalidCalldata {
            index: 0,
            source: CalldataError::TooShort { len: 2 }
        })
    ));

    let mut padded = encode_transfer(wallet_owner(), U256::from(1)).to_vec();
    padded.extend_from_slice(&[0u8; 32]);
    assert!(matches!(
        executor.execute_guarded_batch(
            wallet(),
            &[Execution::call(usdc(), padded)],
            &registry,
            &mut account()
        ),
        Err(ExecutorError::InvalidCalldata {
            source: CalldataError::LengthMismatch { .. },
            ..
        })
    ));
}

#[test]
fn approvals_only_for_active_targets() {
    let executor = executor(Arc::new(MemorySink::new()));
    let registry = registry();
    let mut account = account();

    executor
        .execute_guarded_batch(
            wallet(),
            &[Execution::call(usdc(), encode_approve(pool_a(), U256::MAX))],
            &registry,
            &mut account,
        )
        .unwrap();
    assert_eq!(account.allowance(usdc(), wallet(), pool_a()), U256::MAX);

    let result = executor.execute_guarded_batch(
        wallet(),
        &[Execution::call(usdc(), encode_approve(attacker(), U256::MAX))],
        &registry,
        &mut account,
    );
    assert!(matches!(
        result,
        Err(ExecutorError::UnauthorizedApprove { spender, .. }) if spender == attacker()
    ));
    assert_eq!(account.allowance(usdc(), wallet(), attacker()), U256::ZERO);
}

#[test]
fn transfer_from_checks_recipient_word() {
    let executor = executor(Arc::new(MemorySink::new()));
    let mut registry = registry();
    registry
        .add_entries(admin(), &[usdc()], &[vg_executor::calldata::TRANSFER_FROM])
        .unwrap();

    // `from` is the wallet owner, but the recipient is what matters.
    let call = Execution::call(
        usdc(),
        encode_transfer_from(wallet_owner(), attacker(), U256::from(1)),
    );
    assert!(matches!(
        executor.execute_guarded_batch(wallet(), &[call], &registry, &mut account()),
        Err(ExecutorError::UnauthorizedTransfer { recipient, .. }) if recipient == attacker()
    ));
}

#[test]
fn paused_executor_refuses_batches() {
    let mut executor = executor(Arc::new(MemorySink::new()));
    executor.pause(admin()).unwrap();

    assert!(matches!(
        executor.execute_guarded_batch(wallet(), &[transfer(wallet(), 1)], &registry(), &mut account()),
        Err(ExecutorError::Pause(PauseError::EnforcedPause))
    ));

    executor.unpause(admin()).unwrap();
    executor
        .execute_guarded_batch(wallet(), &[transfer(wallet(), 1)], &registry(), &mut account())
        .unwrap();
}

#[test]
fn paused_registry_still_serves_reads() {
    let executor = executor(Arc::new(MemorySink::new()));
    let mut registry = registry();
    registry.pause(admin()).unwrap();

    executor
        .execute_guarded_batch(wallet(), &[transfer(wallet(), 1)], &registry, &mut account())
        .unwrap();
}

#[test]
fn registry_pointer_swap_takes_effect_on_next_batch() {
    let mut executor = executor(Arc::new(MemorySink::new()));

    let mut strict = WhitelistRegistry::new(addr(0xEF), admin(), RegistryConfig::immediate());
    strict.add_entries(admin(), &[pool_a()], &[SUPPLY_ID]).unwrap();

    let mut registries = HashMap::new();
    registries.insert(registry_address(), registry());
    registries.insert(addr(0xEF), strict);

    let batch = [transfer(wallet(), 1)];
    executor
        .execute_guarded_batch(wallet(), &batch, &registries, &mut account())
        .unwrap();

    executor.update_registry(admin(), addr(0xEF)).unwrap();
    assert!(matches!(
        executor.execute_guarded_batch(wallet(), &batch, &registries, &mut account()),
        Err(ExecutorError::NotWhitelisted { .. })
    ));

    executor.update_registry(admin(), addr(0x77)).unwrap();
    assert!(matches!(
        executor.execute_guarded_batch(wallet(), &batch, &registries, &mut account()),
        Err(ExecutorError::RegistryUnavailable { registry }) if registry == addr(0x77)
    ));
}

#[test]
fn allowed_tokens_only_scope_leaves_other_tokens_unrestricted() {
    let executor = executor(Arc::new(MemorySink::new()));
    let mut registry = registry_with(
        RegistryConfig::immediate().with_recipient_scope(RecipientScope::AllowedTokensOnly),
    );
    let batch = [transfer(attacker(), 5)];

    executor
        .execute_guarded_batch(wallet(), &batch, &registry, &mut account())
        .unwrap();

    registry.set_allowed_token(admin(), usdc(), true).unwrap();
    assert!(matches!(
        executor.execute_guarded_batch(wallet(), &batch, &registry, &mut account()),
        Err(ExecutorError::UnauthorizedTransfer { .. })
    ));
}

#[test]
fn explicit_recipient_allows_transfer() {
    let executor = executor(Arc::new(MemorySink::new()));
    let mut registry = registry();
    registry
        .add_allowed_recipients(admin(), usdc(), &[addr(0x30)])
        .unwrap();
    let mut account = account();

    executor
        .execute_guarded_batch(wallet(), &[transfer(addr(0x30), 250)], &registry, &mut account)
        .unwrap();
    assert_eq!(account.balance_of(usdc(), addr(0x30)), U256::from(250));
}

#[test]
fn runtime_failure_inside_batch_restores_ledger() {
    let executor = executor(Arc::new(MemorySink::new()));
    let mut account = account();

    // Second transfer overdraws: the first must be undone too.
    let result = executor.execute_guarded_batch(
        wallet(),
        &[transfer(wallet_owner(), 600), transfer(wallet_owner(), 600)],
        &registry(),
        &mut account,
    );
    assert!(matches!(result, Err(ExecutorError::CallFailed { index: 1, .. })));
    assert_eq!(account.balance_of(usdc(), wallet()), U256::from(1_000));

    // The runtime is still usable afterwards.
    account
        .forward(wallet(), &transfer(wallet_owner(), 1))
        .unwrap();
}
