pub mod constants;
pub mod error;
pub mod http;
pub mod logs;
pub mod metadata;
pub mod plan;
pub mod referral;
pub mod split;
pub mod token;

pub use {
    error::{
        ReclaimError,
        Result,
    },
    plan::{
        build_close_plan,
        build_close_plans,
        ClosePlan,
        ClosePlanArgs,
    },
    split::{
        Referrer,
        RewardSplit,
    },
    token::TokenAccountState,
};
