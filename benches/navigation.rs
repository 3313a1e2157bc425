use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use room_regions::logging::{LogEvent, LogSink};
use room_regions::{
    LifetimeOverride, LoggingNavigationAudit, LoggingResult, Logger, ManagerConfig,
    NavigationAware, NavigationRequest, RegionConfig, RegionManager, TargetCatalog,
    TargetDefinition, View, ViewHandle, ViewModel,
};
use tokio::runtime::{Builder, Runtime};

#[derive(Clone, Default)]
struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _event: &LogEvent) -> LoggingResult<()> {
        Ok(())
    }
}

const MAIN_REGION: &str = "shell:main";
const HISTORY_REGION: &str = "shell:history";

struct Page(&'static str);

impl View for Page {
    fn name(&self) -> &str {
        self.0
    }
}

struct Inbox;

impl ViewModel for Inbox {
    fn as_navigation_aware(&self) -> Option<&dyn NavigationAware> {
        Some(self)
    }
}

impl NavigationAware for Inbox {}

struct Compose;

impl ViewModel for Compose {
    fn as_lifetime_override(&self) -> Option<&dyn LifetimeOverride> {
        Some(self)
    }
}

impl LifetimeOverride for Compose {
    fn keep_alive(&self) -> bool {
        false
    }
}

fn runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime")
}

fn build_manager() -> RegionManager {
    let catalog = Arc::new(TargetCatalog::new());
    catalog
        .register(TargetDefinition::new("inbox", || Inbox, |_| {
            ViewHandle::new(Page("inbox"))
        }))
        .expect("register inbox");
    catalog
        .register(TargetDefinition::new("compose", || Compose, |_| {
            ViewHandle::new(Page("compose"))
        }))
        .expect("register compose");

    let logger = Logger::new(NullSink);
    let config = ManagerConfig::new().with_region(HISTORY_REGION, RegionConfig::stack());
    let mut manager = RegionManager::from_catalog(catalog)
        .with_config(config)
        .with_audit(Arc::new(LoggingNavigationAudit::new(logger).log_attempts(true)));
    manager.enable_metrics();
    manager
}

fn replace_ping_pong(c: &mut Criterion) {
    let rt = runtime();
    let manager = build_manager();
    manager.get_or_create(MAIN_REGION).expect("region");
    c.bench_function("replace_ping_pong", |b| {
        b.iter(|| {
            rt.block_on(async {
                for target in ["inbox", "compose"] {
                    let request = NavigationRequest::new(black_box(target));
                    manager
                        .navigate(MAIN_REGION, request)
                        .await
                        .expect("navigate");
                }
            })
        });
    });
}

fn stack_back_and_forth(c: &mut Criterion) {
    let rt = runtime();
    let manager = build_manager();
    manager.get_or_create(HISTORY_REGION).expect("region");
    rt.block_on(async {
        manager
            .navigate(HISTORY_REGION, "inbox")
            .await
            .expect("seed inbox");
        manager
            .navigate(HISTORY_REGION, "compose")
            .await
            .expect("seed compose");
    });
    c.bench_function("stack_back_and_forth", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(manager.go_back(HISTORY_REGION).await.expect("back"));
                black_box(manager.go_forward(HISTORY_REGION).await.expect("forward"));
            })
        });
    });
}

criterion_group!(benches, replace_ping_pong, stack_back_and_forth);
criterion_main!(benches);
