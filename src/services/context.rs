use uuid::Uuid;

use crate::db::models::user::AuthUser;
use crate::middleware::auth::AuthUserInfo;

/// Caller identity handed to services. The name and avatar are snapshotted into comments.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl From<&AuthUser> for RequestContext {
    fn from(user: &AuthUser) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

impl From<&AuthUserInfo> for RequestContext {
    fn from(info: &AuthUserInfo) -> Self {
        Self::from(&info.user)
    }
}
