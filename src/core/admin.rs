//! Administrative maintenance.

use crate::{
    core::principal::{Principal, Role},
    entities::{Complaint, Emergency, Visitor},
    errors::{Error, Result},
    store::{Collection, Store},
};
use tracing::warn;

/// Deletes every document in one of the log collections (complaints,
/// visitors, emergencies). Returns the number of documents removed.
pub async fn clear_logs(
    store: &Store,
    principal: &Principal,
    collection: Collection,
) -> Result<u64> {
    principal.require(&[Role::Admin], "clear logs")?;

    let removed = match collection {
        Collection::Complaints => store.clear::<Complaint>(collection).await?,
        Collection::Visitors => store.clear::<Visitor>(collection).await?,
        Collection::Emergencies => store.clear::<Emergency>(collection).await?,
        _ => {
            return Err(Error::Config {
                message: format!("{collection} cannot be cleared"),
            });
        }
    };

    warn!(%collection, removed, by = %principal.id, "Logs cleared");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::complaint::all_complaints;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_clear_complaint_log() -> Result<()> {
        let store = setup_test_store().await?;
        let resident = resident_principal(&store, "Asha", "B-204").await?;
        create_test_complaint(&store, &resident, "Leaking tap").await?;
        create_test_complaint(&store, &resident, "Noise").await?;

        let removed = clear_logs(&store, &admin_principal(), Collection::Complaints).await?;
        assert_eq!(removed, 2);
        assert!(store.fetch(all_complaints()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_ledgers_cannot_be_cleared() -> Result<()> {
        let store = setup_test_store().await?;
        let result = clear_logs(&store, &admin_principal(), Collection::Funds).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_only_admins_clear_logs() -> Result<()> {
        let store = setup_test_store().await?;
        let result = clear_logs(&store, &security_principal(), Collection::Visitors).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        Ok(())
    }
}
