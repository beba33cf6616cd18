//! Space permission trait definition.

use botmaas_types::error::RepositoryError;
use botmaas_types::workflow::SpaceId;

/// Answers whether a user may clone an origin into a target space.
pub trait SpaceAccess: Send + Sync {
    /// `target_space` is where the clone will live (`None` = personal);
    /// `origin_space` is the space owning the origin (`None` = public).
    fn can_access(
        &self,
        uid: &str,
        target_space: Option<&SpaceId>,
        origin_space: Option<&SpaceId>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
