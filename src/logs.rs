use tracing::Level;
use tracing_subscriber::{
    filter,
    fmt::time::ChronoLocal,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub fn registry_logs(level: Level) {
    let filter = filter::Targets::new().with_target("slbscan", level);

    let layer = tracing_subscriber::fmt::layer()
        .with_level(true)
        .with_target(false)
        .with_timer(ChronoLocal::new("%F %X%.3f".to_string()));

    tracing_subscriber::registry().with(filter).with(layer).init();
}
