use chrono::{Local, TimeZone};
use dualsink::logger::{Filter, Format, LogFacade, LogRecord, MemoryAppender, ProcessInfo, Severity};
use proptest::prelude::*;
use std::sync::Arc;

fn severity() -> impl Strategy<Value = Severity> {
    prop::sample::select(Severity::ALL.to_vec())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: None,
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_render_matches_template(
        sev in severity(),
        thread_id in 1u64..100_000,
        pid in 1u32..4_000_000,
        name in "[A-Za-z0-9_-]{1,16}",
        message in "[ -~]{0,64}",
        micros in 0u32..1_000_000,
        secs in 0u32..86_400,
    ) {
        let base = Local.with_ymd_and_hms(2023, 1, 15, 0, 0, 0).unwrap();
        let ts = base + chrono::Duration::seconds(secs as i64) + chrono::Duration::microseconds(micros as i64);
        let rec = LogRecord {
            timestamp: ts,
            thread_id,
            severity: sev,
            process_id: pid,
            process_name: name.as_str().into(),
            message: message.clone(),
        };
        let line = Format::standard().render(&rec);
        let expected = format!(
            "[{}] [{thread_id}] [{}] [{pid}] [{name}] {message}",
            ts.format("%Y-%m-%d %H:%M:%S%.6f"),
            sev.label(),
        );
        prop_assert_eq!(line, expected);
    }

    #[test]
    fn prop_only_info_and_above_reach_sinks(sevs in prop::collection::vec(severity(), 0..32)) {
        let file = MemoryAppender::new();
        let console = MemoryAppender::new();
        let facade = LogFacade::with_backends(ProcessInfo::current(), Arc::new(file.clone()), Arc::new(console.clone()));
        for s in &sevs {
            facade.write(*s, s.label());
        }
        let accepted = sevs.iter().filter(|s| **s >= Severity::Info).count();
        prop_assert_eq!(file.lines().len(), accepted);
        prop_assert_eq!(console.lines(), file.lines());
        prop_assert!(Filter::threshold(Severity::Info).accepts(Severity::Info));
    }
}
