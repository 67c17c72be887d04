//! Position onboarding and read paths
//!
//! Read paths degrade: when the live refresh fails the cached snapshot is
//! served with `balancesStale = true`. Only the forced refresh surfaces the
//! upstream error.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::PositionError;
use super::models::{BankAccount, LiquidityPosition, LiquidityType, NewPosition, PositionView};
use super::store::PositionStore;
use crate::banking::{BankError, BankVerifier};
use crate::core_types::{NetworkBalances, UserId};
use crate::ledger::{LedgerAdapter, LedgerError};
use crate::transaction::{TransactionPage, TransactionQuery, TransactionStore};
use crate::wallet::{WalletAddresses, WalletProvider};

#[derive(Debug, Clone)]
pub struct CreatePosition {
    pub liquidity_type: LiquidityType,
    pub account_number: String,
    pub bank_code: String,
    /// Used only when the bank provider cannot resolve the name right now
    pub account_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateBankAccount {
    pub account_number: String,
    pub bank_code: String,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletsView {
    pub wallet_id: String,
    pub addresses: WalletAddresses,
    pub balances: NetworkBalances,
    pub total_balance: Decimal,
    pub balances_stale: bool,
}

pub struct PositionService {
    positions: Arc<dyn PositionStore>,
    transactions: Arc<dyn TransactionStore>,
    ledger: Arc<dyn LedgerAdapter>,
    wallets: Arc<dyn WalletProvider>,
    banks: Arc<dyn BankVerifier>,
}

impl PositionService {
    pub fn new(
        positions: Arc<dyn PositionStore>,
        transactions: Arc<dyn TransactionStore>,
        ledger: Arc<dyn LedgerAdapter>,
        wallets: Arc<dyn WalletProvider>,
        banks: Arc<dyn BankVerifier>,
    ) -> Self {
        Self {
            positions,
            transactions,
            ledger,
            wallets,
            banks,
        }
    }

    /// Onboard a user: verify the bank account, provision wallets, store the position
    pub async fn create_position(
        &self,
        user_id: UserId,
        request: CreatePosition,
    ) -> Result<PositionView, PositionError> {
        if self.positions.get_active(user_id).await?.is_some() {
            return Err(PositionError::AlreadyExists);
        }

        let (bank_account, is_verified) = self
            .verify_bank_account(
                &request.account_number,
                &request.bank_code,
                request.account_name.as_deref(),
            )
            .await?;

        let wallets = self.wallets.create_user_wallets(user_id).await?;

        let position = NewPosition {
            user_id,
            wallet_id: wallets.wallet_id,
            liquidity_type: request.liquidity_type,
            bank_account,
            is_verified,
        }
        .into_position();
        self.positions.create(&position).await?;

        tracing::info!(
            user_id,
            position_id = %position.position_id,
            liquidity_type = %position.liquidity_type,
            is_verified,
            "Liquidity position created"
        );
        Ok(PositionView::new(&position, false))
    }

    /// Active position with freshly refreshed balances when possible
    pub async fn get_position(&self, user_id: UserId) -> Result<PositionView, PositionError> {
        let (position, stale) = self.load_refreshed(user_id).await?;
        Ok(PositionView::new(&position, stale))
    }

    pub async fn get_wallets(&self, user_id: UserId) -> Result<WalletsView, PositionError> {
        let (position, stale) = self.load_refreshed(user_id).await?;
        let wallets = self.wallets.get_user_wallets(user_id).await?;

        Ok(WalletsView {
            wallet_id: wallets.wallet_id,
            addresses: wallets.addresses,
            balances: position.balances,
            total_balance: position.total_balance(),
            balances_stale: stale,
        })
    }

    pub async fn update_bank_account(
        &self,
        user_id: UserId,
        request: UpdateBankAccount,
    ) -> Result<PositionView, PositionError> {
        let position = self.active(user_id).await?;

        let (bank_account, is_verified) = self
            .verify_bank_account(
                &request.account_number,
                &request.bank_code,
                request.account_name.as_deref(),
            )
            .await?;

        if !self
            .positions
            .update_bank_account(position.position_id, &bank_account, is_verified)
            .await?
        {
            return Err(PositionError::NotFound);
        }

        tracing::info!(
            user_id,
            position_id = %position.position_id,
            bank_code = %bank_account.bank_code,
            is_verified,
            "Bank account updated"
        );

        let updated = self.active(user_id).await?;
        Ok(PositionView::new(&updated, false))
    }

    /// Forced refresh; upstream failures are returned, not masked
    pub async fn refresh_balances(&self, user_id: UserId) -> Result<PositionView, PositionError> {
        self.ledger.refresh(user_id).await?;
        let position = self.active(user_id).await?;
        Ok(PositionView::new(&position, false))
    }

    pub async fn list_transactions(
        &self,
        user_id: UserId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, PositionError> {
        Ok(self.transactions.list_for_user(user_id, query).await?)
    }

    async fn active(&self, user_id: UserId) -> Result<LiquidityPosition, PositionError> {
        self.positions
            .get_active(user_id)
            .await?
            .ok_or(PositionError::NotFound)
    }

    async fn load_refreshed(
        &self,
        user_id: UserId,
    ) -> Result<(LiquidityPosition, bool), PositionError> {
        let stale = match self.ledger.refresh(user_id).await {
            Ok(_) => false,
            Err(LedgerError::PositionNotFound(_)) => return Err(PositionError::NotFound),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Balance refresh failed, serving cached balances");
                true
            }
        };
        Ok((self.active(user_id).await?, stale))
    }

    /// Returns the account snapshot and whether the name was resolved by the provider
    async fn verify_bank_account(
        &self,
        account_number: &str,
        bank_code: &str,
        fallback_name: Option<&str>,
    ) -> Result<(BankAccount, bool), PositionError> {
        if !self.banks.is_valid_account_number(account_number) {
            return Err(BankError::InvalidAccountNumber.into());
        }

        let banks = self.banks.list_banks().await?;
        let bank = banks
            .into_iter()
            .find(|b| b.code == bank_code)
            .ok_or_else(|| BankError::UnknownBankCode(bank_code.to_string()))?;

        let fallback = fallback_name.map(str::trim).filter(|n| !n.is_empty());
        let (account_name, is_verified) =
            match self.banks.resolve_account(account_number, bank_code).await {
                Ok(resolved) => (resolved.account_name, true),
                Err(BankError::Unavailable(msg)) => match fallback {
                    Some(name) => {
                        tracing::warn!(bank_code, error = %msg, "Account resolution unavailable, storing unverified");
                        (name.to_string(), false)
                    }
                    None => return Err(PositionError::UpstreamUnavailable(msg)),
                },
                Err(other) => return Err(other.into()),
            };

        Ok((
            BankAccount {
                account_number: account_number.to_string(),
                bank_code: bank.code,
                bank_name: bank.name,
                account_name,
            },
            is_verified,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ChainLedger;
    use crate::position::MemoryPositionStore;
    use crate::testing::{MockBankVerifier, MockWalletProvider};
    use crate::transaction::MemoryTransactionStore;

    struct Fixture {
        service: PositionService,
        positions: Arc<MemoryPositionStore>,
        wallets: Arc<MockWalletProvider>,
        banks: Arc<MockBankVerifier>,
    }

    fn fixture() -> Fixture {
        let positions = Arc::new(MemoryPositionStore::new());
        let wallets = Arc::new(MockWalletProvider::new());
        let banks = Arc::new(MockBankVerifier::new());
        let ledger = Arc::new(ChainLedger::new(positions.clone(), wallets.clone()));
        let service = PositionService::new(
            positions.clone(),
            Arc::new(MemoryTransactionStore::new()),
            ledger,
            wallets.clone(),
            banks.clone(),
        );
        Fixture {
            service,
            positions,
            wallets,
            banks,
        }
    }

    fn create_request() -> CreatePosition {
        CreatePosition {
            liquidity_type: LiquidityType::Offramp,
            account_number: "0123456789".into(),
            bank_code: "058".into(),
            account_name: None,
        }
    }

    #[tokio::test]
    async fn test_create_verifies_and_provisions() {
        let f = fixture();
        let view = f.service.create_position(7, create_request()).await.unwrap();

        assert!(view.is_verified);
        assert_eq!(view.bank_account.bank_name, "GTBank");
        assert_eq!(view.bank_account.account_name, "ADA OBI");
        assert_eq!(view.wallet_id, "wallet-7");
        assert_eq!(f.wallets.create_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let f = fixture();
        f.service.create_position(7, create_request()).await.unwrap();

        let err = f
            .service
            .create_position(7, create_request())
            .await
            .unwrap_err();
        assert_eq!(err, PositionError::AlreadyExists);
        // no second wallet provisioned
        assert_eq!(f.wallets.create_count(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_bank_details() {
        let f = fixture();

        let mut bad_number = create_request();
        bad_number.account_number = "12345".into();
        assert!(matches!(
            f.service.create_position(1, bad_number).await,
            Err(PositionError::Validation(_))
        ));

        let mut bad_code = create_request();
        bad_code.bank_code = "000".into();
        assert!(matches!(
            f.service.create_position(1, bad_code).await,
            Err(PositionError::Validation(_))
        ));
        assert!(f.positions.get_active(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unresolvable_name_falls_back_to_unverified() {
        let f = fixture();
        f.banks.set_resolve_unavailable(true);

        let err = f
            .service
            .create_position(1, create_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PositionError::UpstreamUnavailable(_)));

        let mut with_name = create_request();
        with_name.account_name = Some("Ada Obi".into());
        let view = f.service.create_position(1, with_name).await.unwrap();
        assert!(!view.is_verified);
        assert_eq!(view.bank_account.account_name, "Ada Obi");
    }

    #[tokio::test]
    async fn test_get_position_degrades_to_cached_balances() {
        let f = fixture();
        f.service.create_position(3, create_request()).await.unwrap();
        f.wallets
            .set_balances(3, Decimal::from(10), Decimal::from(2));

        let fresh = f.service.get_position(3).await.unwrap();
        assert!(!fresh.balances_stale);
        assert_eq!(fresh.total_balance, Decimal::from(12));

        f.wallets.set_unavailable(true);
        let cached = f.service.get_position(3).await.unwrap();
        assert!(cached.balances_stale);
        assert_eq!(cached.total_balance, Decimal::from(12));

        assert!(matches!(
            f.service.refresh_balances(3).await,
            Err(PositionError::UpstreamUnavailable(_))
        ));
        assert_eq!(
            f.service.get_position(99).await.unwrap_err(),
            PositionError::NotFound
        );
    }

    #[tokio::test]
    async fn test_wallets_view() {
        let f = fixture();
        f.service.create_position(4, create_request()).await.unwrap();
        f.wallets.set_balances(4, Decimal::from(1), Decimal::from(1));

        let view = f.service.get_wallets(4).await.unwrap();
        assert_eq!(view.wallet_id, "wallet-4");
        assert!(view.addresses.base.starts_with("0x"));
        assert_eq!(view.total_balance, Decimal::from(2));
    }

    #[tokio::test]
    async fn test_update_bank_account() {
        let f = fixture();
        f.service.create_position(5, create_request()).await.unwrap();

        let view = f
            .service
            .update_bank_account(
                5,
                UpdateBankAccount {
                    account_number: "9876543210".into(),
                    bank_code: "044".into(),
                    account_name: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(view.bank_account.bank_name, "Access Bank");
        assert_eq!(view.bank_account.account_number, "9876543210");

        let missing = f
            .service
            .update_bank_account(
                6,
                UpdateBankAccount {
                    account_number: "9876543210".into(),
                    bank_code: "044".into(),
                    account_name: None,
                },
            )
            .await;
        assert_eq!(missing.unwrap_err(), PositionError::NotFound);
    }
}
