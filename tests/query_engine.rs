//! Query exchanges, retries and sweeps against a scripted bus

mod common;

use common::*;
use ks236_protocol::codec::verify_checksum;
use ks236_protocol::{
    EnergyProfile, Fault, Ks236Error, Preset, RangeSettings, SweepStatus,
};

#[test]
fn query_probe_three_parses_energy_profile() {
    let reply = energy_response(0xD3, [2, 2, 2, 1, 0, 2, 5, 6, 2]);
    let mut bus = bus([Step::Reply(reply)]);

    let profile = bus.query_energy(3).unwrap();

    assert_eq!(
        profile,
        EnergyProfile {
            ranges: [
                RangeSettings::new(2, 2, 2),
                RangeSettings::new(1, 0, 2),
                RangeSettings::new(5, 6, 2),
            ]
        }
    );

    let (transport, sleeper) = bus.into_parts();
    assert_eq!(transport.writes, vec![vec![0xE8, 0x99, 0xD3, 0xE8 ^ 0x99 ^ 0xD3]]);
    assert!(verify_checksum(&transport.writes[0]));
    assert_eq!(transport.clears, 1);
    assert_eq!(transport.reads, vec![15]);
    assert_eq!(sleeper.millis(), vec![100]);
}

#[test]
fn query_p_values_reads_21_bytes() {
    let values = Preset::MEDIUM.values;
    let mut bus = bus([Step::Reply(p_value_response(0xE5, &values))]);

    let profile = bus.query_p_values(5).unwrap();

    assert_eq!(profile.values(), &values);
    assert_eq!(bus.transport().writes[0][2], 0xE5);
    assert_eq!(bus.transport().reads, vec![21]);
}

#[test]
fn silent_bus_exhausts_retry_budget() {
    let mut bus = bus([]);

    let err = bus.query_energy(1).unwrap_err();

    match err {
        Ks236Error::ExchangeFailed {
            probe,
            attempts,
            last,
        } => {
            assert_eq!(probe, 1);
            assert_eq!(attempts, 3);
            assert_eq!(last, Fault::NoResponse);
        }
        other => panic!("expected ExchangeFailed, got {:?}", other),
    }
    assert_eq!(bus.transport().writes.len(), 3);
    assert_eq!(bus.transport().clears, 3);
}

#[test]
fn energy_backoff_grows_by_100ms() {
    let mut bus = bus([]);
    let _ = bus.query_energy(2);

    // pre-read, retry wait, pre-read, retry wait, pre-read
    assert_eq!(bus.sleeper().millis(), vec![100, 200, 200, 200, 300]);
}

#[test]
fn p_value_backoff_grows_by_50ms() {
    let mut bus = bus([]);
    let _ = bus.query_p_values(2);

    assert_eq!(bus.sleeper().millis(), vec![100, 200, 150, 200, 200]);
}

#[test]
fn recovers_after_incomplete_and_corrupt_responses() {
    let good = energy_response(0xD4, [3, 2, 2, 1, 0, 2, 5, 6, 2]);
    let mut corrupt = good.clone();
    corrupt[5] ^= 0x01;

    let mut bus = bus([
        Step::Reply(good[..9].to_vec()),
        Step::Reply(corrupt),
        Step::Reply(good),
    ]);

    assert_eq!(bus.query_energy(4).unwrap(), EnergyProfile::default());
    assert_eq!(bus.transport().writes.len(), 3);
}

#[test]
fn wrong_echo_is_not_accepted() {
    // Probe 2's answer arriving for a probe 1 query
    let stray = energy_response(0xD2, [3, 2, 2, 1, 0, 2, 5, 6, 2]);
    let mut bus = bus([
        Step::Reply(stray.clone()),
        Step::Reply(stray.clone()),
        Step::Reply(stray),
    ]);

    let err = bus.query_energy(1).unwrap_err();
    assert!(matches!(
        err,
        Ks236Error::ExchangeFailed { last: Fault::Malformed, .. }
    ));
}

#[test]
fn last_fault_is_reported() {
    let good = energy_response(0xD1, [3, 2, 2, 1, 0, 2, 5, 6, 2]);
    let mut bus = bus([Step::Silent, Step::Silent, Step::Reply(good[..10].to_vec())]);

    let err = bus.query_energy(1).unwrap_err();
    assert!(matches!(
        err,
        Ks236Error::ExchangeFailed { last: Fault::Incomplete(10), .. }
    ));
}

#[test]
fn transport_errors_consume_attempts() {
    let good = energy_response(0xD1, [3, 2, 2, 1, 0, 2, 5, 6, 2]);
    let mut bus = bus([Step::WriteFault, Step::ReadFault, Step::Reply(good)]);

    assert!(bus.query_energy(1).is_ok());
    assert_eq!(bus.transport().writes.len(), 3);

    let mut bus = common::bus([Step::WriteFault, Step::ReadFault, Step::WriteFault]);
    let err = bus.query_energy(1).unwrap_err();
    assert!(matches!(
        err,
        Ks236Error::ExchangeFailed { last: Fault::Transport(_), attempts: 3, .. }
    ));
}

#[test]
fn short_write_skips_waits() {
    let good = energy_response(0xD1, [3, 2, 2, 1, 0, 2, 5, 6, 2]);
    let mut bus = bus([Step::ShortWrite, Step::Reply(good)]);

    assert!(bus.query_energy(1).is_ok());
    // No pre-read or retry wait for the short write; second attempt uses step 1
    assert_eq!(bus.sleeper().millis(), vec![200]);
    assert_eq!(bus.transport().writes.len(), 2);
}

#[test]
fn invalid_probe_numbers_never_touch_the_bus() {
    let mut bus = bus([]);

    assert!(matches!(
        bus.query_energy(0),
        Err(Ks236Error::InvalidProbeNumber { .. })
    ));
    assert!(matches!(
        bus.query_energy(13),
        Err(Ks236Error::InvalidProbeNumber { max: 12, .. })
    ));
    assert!(matches!(
        bus.query_p_values(10),
        Err(Ks236Error::InvalidProbeNumber { max: 9, .. })
    ));
    assert!(bus.transport().writes.is_empty());
    assert!(bus.sleeper().sleeps.is_empty());
}

#[test]
fn energy_probes_ten_to_twelve_are_addressable() {
    let reply = energy_response(0xDC, [3, 2, 2, 1, 0, 2, 5, 6, 2]);
    let mut bus = bus([Step::Reply(reply)]);

    assert!(bus.query_energy(12).is_ok());
    assert_eq!(bus.transport().writes[0][2], 0xDC);
}

#[test]
fn sweep_continues_past_failed_probe() {
    let mut script = Vec::new();
    for probe in 1..=9u8 {
        if probe == 2 {
            script.extend([Step::Silent, Step::Silent, Step::Silent]);
        } else {
            script.push(Step::Reply(energy_response(
                0xD0 + probe,
                [3, 2, 2, 1, 0, 2, 5, 6, 2],
            )));
        }
    }
    let mut bus = bus(script);

    let report = bus.read_all_energy();

    assert_eq!(report.results.len(), 9);
    assert_eq!(report.failed_probes(), vec![2]);
    assert_eq!(report.successes().count(), 8);
    assert_eq!(report.status(), SweepStatus::Partial);
    assert_eq!(report.status().exit_code(), 1);

    // 8 single exchanges + 3 attempts for probe 2
    assert_eq!(bus.transport().writes.len(), 11);
    let inter_probe = bus.sleeper().millis().iter().filter(|&&ms| ms == 100).count();
    // 8 first pre-reads, 1 for probe 2's first attempt, 9 inter-probe waits
    assert_eq!(inter_probe, 18);
}

#[test]
fn sweep_of_p_values_all_succeed() {
    let script: Vec<Step> = (1..=3u8)
        .map(|probe| Step::Reply(p_value_response(0xE0 + probe, &Preset::DEFAULT.values)))
        .collect();
    let mut bus = bus(script);

    let report = bus.sweep_p_values(1..=3);

    assert_eq!(report.status(), SweepStatus::Complete);
    assert!(report
        .successes()
        .all(|(_, profile)| *profile == Preset::DEFAULT.profile()));
}

#[test]
fn sweep_of_silent_bus_fails() {
    let mut bus = bus([]);
    let report = bus.sweep_p_values([1, 2]);
    assert_eq!(report.status(), SweepStatus::Failed);
    assert_eq!(report.status().exit_code(), 2);
}
