use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::Map;
use tabnav::{
    MemoryScreenHost, NavigationManager, NavigationState, Screen, SequentialTagSource, TabSpec,
};

#[derive(Clone)]
struct BenchScreen(&'static str);

impl Screen for BenchScreen {
    fn kind(&self) -> &str {
        self.0
    }
}

type Host = MemoryScreenHost<BenchScreen>;

const TABS: [&str; 3] = ["main", "favorites", "basket"];

fn specs() -> Vec<TabSpec<BenchScreen>> {
    TABS.into_iter()
        .map(|tab| TabSpec::new(tab, || BenchScreen("root")))
        .collect()
}

fn manager(host: Host) -> NavigationManager<Host> {
    NavigationManager::with_tag_source(host, SequentialTagSource::new())
}

fn push_pop_cycle(c: &mut Criterion) {
    c.bench_function("navigation_push_pop_cycle", |b| {
        b.iter(|| {
            let mut nav = manager(Host::new());
            nav.init(specs(), None).expect("init");
            for tab in TABS {
                nav.select(black_box(tab)).expect("select");
                for _ in 0..8 {
                    nav.push(BenchScreen("detail")).expect("push");
                }
            }
            while nav.pop_back().expect("pop") {}
        });
    });
}

fn save_restore(c: &mut Criterion) {
    let mut nav = manager(Host::new());
    nav.init(specs(), None).expect("init");
    for tab in TABS {
        nav.select(tab).expect("select");
        for _ in 0..16 {
            nav.push(BenchScreen("detail")).expect("push");
        }
    }
    let mut bag = Map::new();
    nav.save_into(&mut bag).expect("save");
    let host = nav.into_host();

    c.bench_function("navigation_save_restore", |b| {
        b.iter(|| {
            let state = NavigationState::read_from(black_box(&bag)).expect("read");
            let mut restored = manager(host.clone().recreate());
            restored.init(specs(), Some(&state)).expect("restore");
            black_box(restored.selected_tab().map(str::len));
        });
    });
}

criterion_group!(navigation, push_pop_cycle, save_restore);
criterion_main!(navigation);
