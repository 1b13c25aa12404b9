// recipients.rs — Per-token allowed recipients and transfer authorization.
//
// A transfer of `token` to `recipient` out of `wallet` is authorized when,
// checked in increasing cost order:
//
//   0. the token is outside the restricted scope (allowed-tokens-only mode);
//   1. the recipient is the wallet itself;
//   2. the recipient is explicitly allowed for the token;
//   3. the recipient is an owner of the wallet (external query).
//
// A failing owner query counts as "not an owner". It is never fatal.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use vg_core::WalletOwnerQuery;

use crate::config::RecipientScope;
use crate::error::RegistryError;

/// Allowed recipients per token, plus the tokens marked as restricted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipientBook {
    #[serde(default)]
    allowed_tokens: BTreeSet<Address>,

    #[serde(default)]
    recipients: BTreeMap<Address, BTreeSet<Address>>,
}

impl RecipientBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, token: Address, recipient: Address) -> Result<(), RegistryError> {
        if !self.recipients.entry(token).or_default().insert(recipient) {
            return Err(RegistryError::RecipientAlreadyAllowed { token, recipient });
        }
        Ok(())
    }

    pub fn remove(&mut self, token: Address, recipient: Address) -> Result<(), RegistryError> {
        let removed = self
            .recipients
            .get_mut(&token)
            .is_some_and(|set| set.remove(&recipient));
        if !removed {
            return Err(RegistryError::RecipientNotAllowed { token, recipient });
        }
        if self.recipients.get(&token).is_some_and(BTreeSet::is_empty) {
            self.recipients.remove(&token);
        }
        Ok(())
    }

    pub fn is_allowed_recipient(&self, token: Address, recipient: Address) -> bool {
        self.recipients
            .get(&token)
            .is_some_and(|set| set.contains(&recipient))
    }

    /// Allowed recipients of `token`, in ascending order.
    pub fn recipients_of(&self, token: Address) -> Vec<Address> {
        self.recipients
            .get(&token)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Mark or unmark a token as restricted. Returns whether anything changed.
    pub fn set_allowed_token(&mut self, token: Address, allowed: bool) -> bool {
        if allowed {
            self.allowed_tokens.insert(token)
        } else {
            self.allowed_tokens.remove(&token)
        }
    }

    pub fn is_allowed_token(&self, token: Address) -> bool {
        self.allowed_tokens.contains(&token)
    }
}

/// Why a transfer was (or was not) authorized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum AuthorizationBasis {
    /// The token is outside the restricted scope.
    TokenUnrestricted,
    /// The wallet is sending to itself.
    SelfTransfer,
    /// The recipient is on the token's allowed list.
    AllowedRecipient,
    /// The recipient is an owner of the wallet.
    WalletOwner,
    /// None of the rules matched. `owner_query_failed` is set when the owner
    /// query errored and was read as "not an owner".
    Denied { owner_query_failed: bool },
}

/// The outcome of a transfer authorization check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferAuthorization {
    pub token: Address,
    pub recipient: Address,
    pub wallet: Address,
    pub basis: AuthorizationBasis,
}

impl TransferAuthorization {
    pub fn is_authorized(&self) -> bool {
        !matches!(self.basis, AuthorizationBasis::Denied { .. })
    }
}

/// Decide whether `wallet` may send `token` to `recipient`.
pub fn authorize_transfer(
    book: &RecipientBook,
    scope: RecipientScope,
    owners: &dyn WalletOwnerQuery,
    token: Address,
    recipient: Address,
    wallet: Address,
) -> TransferAuthorization {
    let decide = |basis| TransferAuthorization {
        token,
        recipient,
        wallet,
        basis,
    };

    if scope == RecipientScope::AllowedTokensOnly && !book.is_allowed_token(token) {
        return decide(AuthorizationBasis::TokenUnrestricted);
    }
    if recipient == wallet {
        return decide(AuthorizationBasis::SelfTransfer);
    }
    if book.is_allowed_recipient(token, recipient) {
        return decide(AuthorizationBasis::AllowedRecipient);
    }

    match owners.is_owner(wallet, recipient) {
        Ok(true) => decide(AuthorizationBasis::WalletOwner),
        Ok(false) => decide(AuthorizationBasis::Denied {
            owner_query_failed: false,
        }),
        Err(error) => {
            tracing::warn!(
                %wallet,
                %recipient,
                %error,
                "wallet owner query failed, treating recipient as non-owner"
            );
            decide(AuthorizationBasis::Denied {
                owner_query_failed: true,
            })
        }
    }
}
