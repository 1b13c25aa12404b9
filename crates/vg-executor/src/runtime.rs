// runtime.rs — The custodial account's call-forwarding capability.
//
// The executor never performs calls itself. It hands each validated
// execution to an `AccountRuntime`, which performs it so the callee sees the
// custodial account as the caller. The runtime also owns the transaction
// boundary: everything forwarded inside `atomically` is rolled back if the
// closure fails.
//
// `SimulatedAccount` is an in-memory runtime with a minimal ERC-20 ledger.
// It understands the four token functions the executor inspects and records
// every other call without effect.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, Bytes, U256};
use vg_core::Execution;

use crate::calldata::{self, TokenCall, INCREASE_ALLOWANCE};
use crate::error::ForwardError;

/// Forwards calls on behalf of a custodial account.
pub trait AccountRuntime {
    /// Perform `execution` with `account` as the caller. Returns the
    /// callee's return data.
    fn forward(&mut self, account: Address, execution: &Execution) -> Result<Bytes, ForwardError>;

    /// Run `f` as one transaction. If `f` returns `Err`, every effect of the
    /// calls it forwarded is undone.
    fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E>
    where
        Self: Sized;
}

/// A call that took effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedCall {
    pub account: Address,
    pub target: Address,
    pub value: U256,
    pub payload: Bytes,
}

/// In-memory account runtime with per-token balances and allowances.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAccount {
    /// token → holder → balance
    balances: BTreeMap<Address, BTreeMap<Address, U256>>,
    /// token → (holder, spender) → allowance
    allowances: BTreeMap<Address, BTreeMap<(Address, Address), U256>>,
    reverting: BTreeSet<Address>,
    calls: Vec<ForwardedCall>,
}

impl SimulatedAccount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `holder` with `amount` of `token` (builder pattern).
    pub fn with_balance(mut self, token: Address, holder: Address, amount: U256) -> Self {
        self.balances.entry(token).or_default().insert(holder, amount);
        self
    }

    /// Make every call to `target` revert.
    pub fn with_reverting_target(mut self, target: Address) -> Self {
        self.reverting.insert(target);
        self
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&token)
            .and_then(|holders| holders.get(&holder))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, token: Address, holder: Address, spender: Address) -> U256 {
        self.allowances
            .get(&token)
            .and_then(|entries| entries.get(&(holder, spender)))
            .copied()
            .unwrap_or_default()
    }

    /// Calls that took effect, oldest first.
    pub fn calls(&self) -> &[ForwardedCall] {
        &self.calls
    }

    fn move_tokens(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ForwardError> {
        let available = self.balance_of(token, from);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| revert(token, "insufficient balance"))?;
        let holders = self.balances.entry(token).or_default();
        holders.insert(from, remaining);
        let credited = holders.entry(to).or_default();
        *credited = credited.saturating_add(amount);
        Ok(())
    }

    fn spend_allowance(
        &mut self,
        token: Address,
        holder: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ForwardError> {
        let remaining = self
            .allowance(token, holder, spender)
            .checked_sub(amount)
            .ok_or_else(|| revert(token, "insufficient allowance"))?;
        self.allowances
            .entry(token)
            .or_default()
            .insert((holder, spender), remaining);
        Ok(())
    }

    fn apply_token_call(
        &mut self,
        account: Address,
        execution: &Execution,
        call: TokenCall,
    ) -> Result<(), ForwardError> {
        let token = execution.target;
        match call {
            TokenCall::Transfer {
                from: None,
                recipient,
                amount,
            } => self.move_tokens(token, account, recipient, amount),
            TokenCall::Transfer {
                from: Some(from),
                recipient,
                amount,
            } => {
                self.spend_allowance(token, from, account, amount)?;
                self.move_tokens(token, from, recipient, amount)
            }
            TokenCall::Approval { spender, amount } => {
                let increase = calldata::selector_of(&execution.payload)
                    .is_ok_and(|selector| selector == INCREASE_ALLOWANCE);
                let entry = self
                    .allowances
                    .entry(token)
                    .or_default()
                    .entry((account, spender))
                    .or_default();
                *entry = if increase {
                    entry.saturating_add(amount)
                } else {
                    amount
                };
                Ok(())
            }
        }
    }
}

fn revert(target: Address, reason: &str) -> ForwardError {
    ForwardError::Reverted {
        target,
        reason: reason.to_string(),
    }
}

/// ABI-encoded `true`, what ERC-20 functions return on success.
fn abi_true() -> Bytes {
    let mut word = [0u8; 32];
    word[31] = 1;
    Bytes::copy_from_slice(&word)
}

impl AccountRuntime for SimulatedAccount {
    fn forward(&mut self, account: Address, execution: &Execution) -> Result<Bytes, ForwardError> {
        if self.reverting.contains(&execution.target) {
            return Err(revert(execution.target, "target reverted"));
        }

        let output = match calldata::decode_token_call(&execution.payload) {
            Ok(Some(call)) => {
                self.apply_token_call(account, execution, call)?;
                abi_true()
            }
            // Opaque call: no ledger effect.
            Ok(None) | Err(_) => Bytes::new(),
        };

        tracing::debug!(%account, target = %execution.target, "call forwarded");
        self.calls.push(ForwardedCall {
            account,
            target: execution.target,
            value: execution.value,
            payload: execution.payload.clone(),
        });
        Ok(output)
    }

    fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let checkpoint = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = checkpoint;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calldata::{encode_approve, encode_increase_allowance, encode_transfer, encode_transfer_from};

    fn addr(byte: u8) -> Address {
        Address::with_last_byte(byte)
    }

    const TOKEN: u8 = 0x10;
    const WALLET: u8 = 0x20;

    fn funded() -> SimulatedAccount {
        SimulatedAccount::new().with_balance(addr(TOKEN), addr(WALLET), U256::from(1_000))
    }

    #[test]
    fn transfer_moves_balance() {
        let mut account = funded();
        let out = account
            .forward(
                addr(WALLET),
                &Execution::call(addr(TOKEN), encode_transfer(addr(0x30), U256::from(250))),
            )
            .unwrap();

        assert_eq!(out.len(), 32);
        assert_eq!(account.balance_of(addr(TOKEN), addr(WALLET)), U256::from(750));
        assert_eq!(account.balance_of(addr(TOKEN), addr(0x30)), U256::from(250));
        assert_eq!(account.calls().len(), 1);
    }

    #[test]
    fn overdraft_reverts_without_effect() {
        let mut account = funded();
        let result = account.forward(
            addr(WALLET),
            &Execution::call(addr(TOKEN), encode_transfer(addr(0x30), U256::from(5_000))),
        );
        assert!(matches!(result, Err(ForwardError::Reverted { .. })));
        assert_eq!(account.balance_of(addr(TOKEN), addr(WALLET)), U256::from(1_000));
        assert!(account.calls().is_empty());
    }

    #[test]
    fn approvals_and_transfer_from() {
        let mut account = funded();
        let spender = addr(0x40);
        account
            .forward(
                addr(WALLET),
                &Execution::call(addr(TOKEN), encode_approve(spender, U256::from(100))),
            )
            .unwrap();
        account
            .forward(
                addr(WALLET),
                &Execution::call(addr(TOKEN), encode_increase_allowance(spender, U256::from(50))),
            )
            .unwrap();
        assert_eq!(account.allowance(addr(TOKEN), addr(WALLET), spender), U256::from(150));

        account
            .forward(
                spender,
                &Execution::call(
                    addr(TOKEN),
                    encode_transfer_from(addr(WALLET), addr(0x50), U256::from(120)),
                ),
            )
            .unwrap();
        assert_eq!(account.allowance(addr(TOKEN), addr(WALLET), spender), U256::from(30));
        assert_eq!(account.balance_of(addr(TOKEN), addr(0x50)), U256::from(120));
    }

    #[test]
    fn atomically_rolls_back_on_error() {
        let mut account = funded().with_reverting_target(addr(0x99));

        let result: Result<(), ForwardError> = account.atomically(|rt| {
            rt.forward(
                addr(WALLET),
                &Execution::call(addr(TOKEN), encode_transfer(addr(0x30), U256::from(10))),
            )?;
            rt.forward(addr(WALLET), &Execution::call(addr(0x99), vec![1u8, 2, 3, 4]))?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(account.balance_of(addr(TOKEN), addr(WALLET)), U256::from(1_000));
        assert!(account.calls().is_empty());
    }

    #[test]
    fn atomically_keeps_effects_on_success() {
        let mut account = funded();
        let value = account
            .atomically(|rt| {
                rt.forward(
                    addr(WALLET),
                    &Execution::call(addr(TOKEN), encode_transfer(addr(0x30), U256::from(10))),
                )
                .map(|out| out.len())
            })
            .unwrap();
        assert_eq!(value, 32);
        assert_eq!(account.balance_of(addr(TOKEN), addr(0x30)), U256::from(10));
    }
}
