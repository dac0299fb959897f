//! Analytics over fetched YouTube data
//!
//! Pure functions: durations, engagement arithmetic, distribution statistics,
//! and the channel, video, trending and comparison aggregations built on them.

pub mod channel;
pub mod comparison;
pub mod duration;
pub mod engagement;
pub mod stats;
pub mod trending;
pub mod video;

pub use channel::{growth_trends, top_keywords, upload_frequency};
pub use comparison::{compare_channels, compare_videos, ChannelComparison, RankEntry, VideoComparison};
pub use duration::{categorize_video_length, parse_duration, DurationInfo};
pub use engagement::{
    engagement_rate, extract_hashtags, format_large_number, growth_rate, view_velocity,
    EngagementRates, GrowthRate, ViewVelocity,
};
pub use stats::{normalize_scores, percentiles, PercentileStats};
pub use trending::{category_distribution, trending_stats, velocity_entries, TrendingVideo, VelocityEntry};
pub use video::{engagement_metrics, performance_insights, EngagementMetrics, PerformanceInsights, VideoSummary};
