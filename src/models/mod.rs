//! Data models for the Threads API

mod container;
mod content;
mod ids;
mod location;
mod options;
mod post;
mod time;
mod token;
mod user;
mod webhook;

pub use container::{ContainerState, ContainerStatus};
pub use content::{
    CarouselItem, CarouselPostContent, CommonOptions, GIF_PROVIDER_TENOR, GifAttachment,
    ImagePostContent, MediaType, PollAttachment, PostContent, ReplyControl, TextAttachment,
    TextEntity, TextPostContent, VideoPostContent,
};
pub use ids::{ContainerId, LocationId, PostId, UserId};
pub use location::{LOCATION_FIELDS, Location, LocationSearchResponse};
pub use options::{
    PaginationOptions, PostsOptions, RepliesOptions, SearchMediaType, SearchMode, SearchOptions,
    SearchType,
};
pub use post::{
    Children, Cursors, Owner, Page, Paging, Post, PostRef, PostsResponse, PublishingLimits,
    QuotaConfig, RepliesResponse, Reply, RepostResult,
};
pub use time::Timestamp;
pub use token::{DebugTokenData, DebugTokenResponse, LongLivedTokenResponse, TokenResponse};
pub use user::{DEFAULT_USER_FIELDS, PublicUser, SearchedKeyword, USER_FIELDS, User};
pub use webhook::{
    SuccessResponse, WebhookField, WebhookSubscription, WebhookSubscriptionsResponse,
};
