use axum::extract::{Extension, Path, State};

use crate::api::format::GroupInfoView;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Capability};

/// GET /api/groups/:group - Membership lists for one group
pub async fn get(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<GroupInfoView> {
    auth_user.require(Capability::Read)?;

    let info = state.json.group_info(&group, &state.cancel_token()).await?;
    Ok(ApiResponse::success(GroupInfoView::from(info)))
}
