pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod utils;

use crate::application::admin_service::AdminService;
use crate::application::auth_service::AuthService;
use crate::application::comment_service::CommentService;
use crate::application::follow_service::FollowService;
use crate::application::media_service::MediaService;
use crate::application::post_service::PostService;
use crate::application::profile_service::ProfileService;
use crate::application::vote_ledger::VoteLedger;
use crate::data::comment_repository::PostgresCommentRepository;
use crate::data::follow_repository::PostgresFollowRepository;
use crate::data::media_repository::PostgresMediaRepository;
use crate::data::post_repository::PostgresPostRepository;
use crate::data::profile_repository::PostgresProfileRepository;
use crate::data::stats_repository::PostgresStatsRepository;
use crate::data::user_repository::PostgresUserRepository;
use crate::data::vote_repository::PostgresVoteRepository;
use crate::infrastructure::content_store::LocalContentStore;

pub type AppAuthService = AuthService<PostgresUserRepository, PostgresProfileRepository>;
pub type AppPostService = PostService<PostgresPostRepository>;
pub type AppCommentService = CommentService<PostgresCommentRepository, PostgresPostRepository>;
pub type AppVoteLedger = VoteLedger<PostgresVoteRepository>;
pub type AppMediaService = MediaService<PostgresMediaRepository, LocalContentStore>;
pub type AppProfileService =
    ProfileService<PostgresUserRepository, PostgresProfileRepository, PostgresFollowRepository>;
pub type AppFollowService =
    FollowService<PostgresUserRepository, PostgresProfileRepository, PostgresFollowRepository>;
pub type AppAdminService = AdminService<PostgresStatsRepository>;
