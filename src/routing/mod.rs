pub mod planner;
pub mod router;

pub use planner::{classify, plan, plan_reduce_only, plan_size_multiplier, OrderPlan, Transition};
pub use router::{OrderRouter, RouteOutcome, RouterOptions, SkipReason};
