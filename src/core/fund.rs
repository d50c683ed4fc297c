//! Community fund ledger.

use crate::{
    core::{
        aggregate::{coerce_amount, current_month},
        lifecycle::is_month_key,
        principal::{Principal, Role},
    },
    entities::{
        FundEntry,
        fund_entry::{self, FundKind},
    },
    errors::{Error, Result},
    store::{Collection, Store},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Select, Set, prelude::*};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

/// Input for [`add_fund_entry`], as submitted from the admin form.
#[derive(Debug, Clone)]
pub struct NewFundEntry {
    pub kind: FundKind,
    /// Amount as entered, a number or numeric string
    pub amount: Value,
    pub description: String,
    /// `YYYY-MM`; the current month when absent
    pub month: Option<String>,
}

/// Appends a ledger entry. The amount must read as a number above zero.
pub async fn add_fund_entry(
    store: &Store,
    principal: &Principal,
    input: NewFundEntry,
) -> Result<fund_entry::Model> {
    principal.require(&[Role::Admin], "record fund entries")?;

    let amount = coerce_amount(&input.amount);
    if amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    let now = Utc::now();
    let month = match input.month {
        Some(month) if is_month_key(&month) => month,
        Some(_) => return Err(Error::MissingField { field: "month" }),
        None => current_month(now),
    };

    let entry = fund_entry::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        kind: Set(input.kind),
        amount: Set(Value::from(amount)),
        description: Set(input.description),
        month: Set(Some(month)),
        created_by: Set(principal.id.clone()),
        created_at: Set(now),
    };

    let model = store.create(Collection::Funds, entry).await?;
    info!(id = %model.id, kind = %model.kind, amount, "Fund entry recorded");
    Ok(model)
}

/// The whole ledger, newest first.
#[must_use]
pub fn fund_ledger() -> Select<FundEntry> {
    FundEntry::find().order_by_desc(fund_entry::Column::CreatedAt)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::aggregate::financial_summary;
    use crate::test_utils::*;
    use serde_json::json;

    fn entry(kind: FundKind, amount: Value, month: Option<&str>) -> NewFundEntry {
        NewFundEntry {
            kind,
            amount,
            description: "Monthly maintenance".to_string(),
            month: month.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_string_amounts_are_stored_as_numbers() -> Result<()> {
        let store = setup_test_store().await?;
        let admin = admin_principal();

        let saved = add_fund_entry(
            &store,
            &admin,
            entry(FundKind::Income, json!("1200.50"), Some("2024-03")),
        )
        .await?;
        assert_eq!(saved.amount, json!(1200.5));
        assert_eq!(saved.month.as_deref(), Some("2024-03"));

        add_fund_entry(
            &store,
            &admin,
            entry(FundKind::Expense, json!(200), Some("2024-03")),
        )
        .await?;
        let ledger = store.fetch(fund_ledger()).await?;
        let summary = financial_summary(&ledger);
        assert_eq!(summary.income, 1200.5);
        assert_eq!(summary.expense, 200.0);
        assert_eq!(summary.balance, 1000.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_positive_amounts_are_rejected() -> Result<()> {
        let store = setup_test_store().await?;
        let admin = admin_principal();

        for amount in [json!(0), json!(-10), json!("abc")] {
            let result =
                add_fund_entry(&store, &admin, entry(FundKind::Income, amount, None)).await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }
        assert!(store.fetch(fund_ledger()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_month_defaults_to_current() -> Result<()> {
        let store = setup_test_store().await?;
        let saved = add_fund_entry(
            &store,
            &admin_principal(),
            entry(FundKind::Expense, json!(50), None),
        )
        .await?;
        assert_eq!(saved.month, Some(current_month(saved.created_at)));
        Ok(())
    }

    #[tokio::test]
    async fn test_only_admins_record_funds() -> Result<()> {
        let store = setup_test_store().await?;
        let result = add_fund_entry(
            &store,
            &security_principal(),
            entry(FundKind::Income, json!(10), None),
        )
        .await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        Ok(())
    }
}
