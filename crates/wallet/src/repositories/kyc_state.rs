use std::{
    ops::Deref,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use tokend_repository::{RepositoryError, SimpleSingleItemRepository, SingleItemLoader};
use tokend_types::{
    ForcedAccountType, KycForm, KycState, MappingError, PagingOrder, PagingParams, RequestState,
    ReviewableRequestResource,
};
use tracing::warn;

use super::{BlobsRepository, RepositoryContext};
use crate::{ChangeRoleRequestsParams, SubmittedKycStatePersistor};

pub struct KycStateLoader {
    context: RepositoryContext,
    blobs: BlobsRepository,
}

impl KycStateLoader {
    async fn load_form(&self, request: &ReviewableRequestResource) -> Result<KycForm, RepositoryError> {
        let details = request.request_details.as_ref().ok_or_else(|| {
            RepositoryError::InconsistentData(format!(
                "change role request {} has no details",
                request.id
            ))
        })?;

        let Some(blob_id) = details
            .creator_details
            .get("blob_id")
            .and_then(|value| value.as_str())
            .filter(|id| !id.is_empty())
        else {
            return Ok(KycForm::Empty);
        };

        let blob = self.blobs.get_by_id(blob_id, true).await?;
        Ok(KycForm::from_blob_value(&blob.value).unwrap_or_else(|e| {
            warn!(blob_id, error = %e, "unreadable KYC form");
            KycForm::Empty
        }))
    }
}

#[async_trait]
impl SingleItemLoader for KycStateLoader {
    type Item = KycState;

    fn name(&self) -> &'static str {
        "kyc_state"
    }

    /// State of the latest change-role request of the account
    async fn load_item(&self) -> Result<KycState, RepositoryError> {
        let account_id = self.context.account_id()?;
        let api = self.context.signed_api()?;

        let params = ChangeRoleRequestsParams {
            requestor: account_id,
            paging: PagingParams::new(None, 1).with_order(PagingOrder::Desc),
        };
        let page = api.get_change_role_requests(&params).await?;
        let Some(request) = page.items.into_iter().next() else {
            return Ok(KycState::Empty);
        };

        let request_id = request
            .id
            .parse::<u64>()
            .map_err(|e| MappingError::invalid("request id", e))?;
        let form = self.load_form(&request).await?;

        Ok(match RequestState::try_from(request.state_i)? {
            RequestState::Approved => KycState::Approved { form, request_id },
            RequestState::Rejected => KycState::Rejected {
                form,
                request_id,
                reject_reason: request.reject_reason.unwrap_or_default(),
            },
            // Permanent rejection and cancellation are not shown as final
            RequestState::Pending | RequestState::Canceled | RequestState::PermanentlyRejected => {
                KycState::Pending { form, request_id }
            }
        })
    }
}

/// KYC state of the signed-in account
#[derive(Clone)]
pub struct KycStateRepository {
    repository: SimpleSingleItemRepository<KycStateLoader>,
    forced_type: Arc<RwLock<Option<ForcedAccountType>>>,
}

impl Deref for KycStateRepository {
    type Target = SimpleSingleItemRepository<KycStateLoader>;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl KycStateRepository {
    pub fn new(
        context: RepositoryContext,
        blobs: BlobsRepository,
        persistor: Option<SubmittedKycStatePersistor>,
    ) -> Self {
        let loader = KycStateLoader { context, blobs };
        let repository = match persistor {
            Some(persistor) => SimpleSingleItemRepository::with_persistence(loader, Arc::new(persistor)),
            None => SimpleSingleItemRepository::new(loader),
        };
        Self {
            repository,
            forced_type: Arc::new(RwLock::new(None)),
        }
    }

    pub fn form_data(&self) -> Option<KycForm> {
        self.item().and_then(|state| state.form().cloned())
    }

    pub fn is_form_approved(&self) -> bool {
        self.item().is_some_and(|state| state.is_approved())
    }

    pub fn forced_type(&self) -> Option<ForcedAccountType> {
        *self.forced_type.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_forced_type(&self, forced_type: Option<ForcedAccountType>) {
        *self.forced_type.write().unwrap_or_else(PoisonError::into_inner) = forced_type;
    }

    /// Whether the account acts as a general one: a general form, an
    /// unapproved corporate form or a forced general type
    pub fn is_actual_or_forced_general(&self) -> bool {
        match self.form_data() {
            Some(KycForm::General(_)) => true,
            Some(KycForm::Corporate(_)) if !self.is_form_approved() => true,
            _ => self.forced_type() == Some(ForcedAccountType::General),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{change_role_request, MockApi, MockApiProvider};
    use crate::{MemoryKeyValueStore, UrlConfigHolder, WalletInfoHolder, WalletInfoProvider};
    use tokend_repository::ItemPersistence;
    use tokend_types::{BlobResource, WalletInfo};

    fn context(api: Arc<MockApi>) -> RepositoryContext {
        let wallet = WalletInfoHolder::default();
        wallet.set_wallet_info(Some(WalletInfo {
            account_id: "ACCOUNT".into(),
            email: "user@test".into(),
            wallet_id: "wallet".into(),
            secret_seed: "00".repeat(32),
        }));
        RepositoryContext::new(
            Arc::new(MockApiProvider::single(api)),
            Arc::new(wallet),
            Arc::new(UrlConfigHolder::default()),
        )
    }

    fn repository(api: Arc<MockApi>, persistor: Option<SubmittedKycStatePersistor>) -> KycStateRepository {
        let context = context(api);
        KycStateRepository::new(context.clone(), BlobsRepository::new(context), persistor)
    }

    fn general_blob() -> BlobResource {
        BlobResource {
            id: "form".into(),
            blob_type: "kyc_form".into(),
            value: r#"{"first_name": "Ann", "last_name": "Lee"}"#.into(),
        }
    }

    fn corporate_blob() -> BlobResource {
        BlobResource {
            id: "form".into(),
            blob_type: "kyc_form".into(),
            value: r#"{"company": "Coffee Shop"}"#.into(),
        }
    }

    #[tokio::test]
    async fn test_no_requests_means_empty() {
        let repo = repository(Arc::new(MockApi::new()), None);

        repo.update(true).await.unwrap();
        assert_eq!(repo.item(), Some(KycState::Empty));
        assert_eq!(repo.form_data(), None);
    }

    #[tokio::test]
    async fn test_latest_request_decides_state() {
        let api = Arc::new(
            MockApi::new()
                .with_requests(vec![
                    change_role_request(1, "ACCOUNT", 4, Some("old")),
                    change_role_request(2, "ACCOUNT", 3, Some("form")),
                ])
                .with_blob(general_blob()),
        );
        let repo = repository(api, None);

        repo.update(true).await.unwrap();
        let state = repo.item().unwrap();
        assert_eq!(state.request_id(), Some(2));
        assert!(repo.is_form_approved());
        assert!(repo.is_actual_or_forced_general());
    }

    #[tokio::test]
    async fn test_rejected_keeps_reason() {
        let mut request = change_role_request(7, "ACCOUNT", 4, Some("form"));
        request.reject_reason = Some("blurry photo".into());
        let api = Arc::new(MockApi::new().with_requests(vec![request]).with_blob(corporate_blob()));
        let repo = repository(api, None);

        repo.update(true).await.unwrap();
        match repo.item().unwrap() {
            KycState::Rejected { reject_reason, form, .. } => {
                assert_eq!(reject_reason, "blurry photo");
                assert!(matches!(form, KycForm::Corporate(_)));
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert!(repo.is_actual_or_forced_general());
    }

    #[tokio::test]
    async fn test_permanently_rejected_shown_as_pending() {
        let mut request = change_role_request(8, "ACCOUNT", 5, Some("form"));
        request.reject_reason = Some("fraud".into());
        let api = Arc::new(MockApi::new().with_requests(vec![request]).with_blob(corporate_blob()));
        let repo = repository(api, None);

        repo.update(true).await.unwrap();
        assert!(matches!(
            repo.item(),
            Some(KycState::Pending { request_id: 8, .. })
        ));
    }

    #[tokio::test]
    async fn test_unreadable_form_becomes_empty() {
        let blob = BlobResource {
            id: "form".into(),
            blob_type: "kyc_form".into(),
            value: r#"{"nickname": "x"}"#.into(),
        };
        let api = Arc::new(
            MockApi::new()
                .with_requests(vec![change_role_request(3, "ACCOUNT", 1, Some("form"))])
                .with_blob(blob),
        );
        let repo = repository(api, None);

        repo.update(true).await.unwrap();
        assert_eq!(
            repo.item(),
            Some(KycState::Pending {
                form: KycForm::Empty,
                request_id: 3
            })
        );
    }

    #[tokio::test]
    async fn test_request_without_details_is_inconsistent() {
        let mut request = change_role_request(3, "ACCOUNT", 1, None);
        request.request_details = None;
        let repo = repository(Arc::new(MockApi::new().with_requests(vec![request])), None);

        assert!(matches!(
            repo.update(true).await,
            Err(RepositoryError::InconsistentData(_))
        ));
    }

    #[tokio::test]
    async fn test_forced_general_type() {
        let api = Arc::new(
            MockApi::new()
                .with_requests(vec![change_role_request(2, "ACCOUNT", 3, Some("form"))])
                .with_blob(corporate_blob()),
        );
        let repo = repository(api, None);
        repo.update(true).await.unwrap();

        assert!(!repo.is_actual_or_forced_general());
        repo.set_forced_type(Some(ForcedAccountType::General));
        assert!(repo.is_actual_or_forced_general());
        assert_eq!(repo.forced_type(), Some(ForcedAccountType::General));
    }

    #[tokio::test]
    async fn test_submitted_state_is_persisted() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let persistor = SubmittedKycStatePersistor::new(store.clone());
        let api = Arc::new(
            MockApi::new()
                .with_requests(vec![change_role_request(2, "ACCOUNT", 1, Some("form"))])
                .with_blob(general_blob()),
        );
        let repo = repository(api, Some(persistor.clone()));

        repo.update(true).await.unwrap();
        assert_eq!(persistor.load_item().and_then(|s| s.request_id()), Some(2));

        repo.clear();
        assert!(store.is_empty());
    }
}
