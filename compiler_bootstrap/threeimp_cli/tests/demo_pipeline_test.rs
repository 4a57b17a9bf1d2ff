//! End-to-end test of the resolve/compile/execute pipeline `threeimp_cli`
//! drives, exercised through the library surface rather than the binary
//! (as `seen_cli::tests::cli_integration_test` exercises its own
//! `project`/`build` modules directly).

use threeimp_cli::demos;
use threeimp_vm::VmConfig;

#[test]
fn every_demo_runs_to_completion_under_default_config() {
    for demo in demos::DEMOS {
        let results = threeimp_cli::execute(demo, VmConfig::default()).unwrap_or_else(|e| panic!("{}: {}", demo.name, e.render()));
        assert!(!results.is_empty(), "{} produced no results", demo.name);
    }
}

#[test]
fn disabling_typecheck_does_not_change_well_typed_demo_results() {
    let demo = demos::find("factorial").unwrap();
    let config = VmConfig { typecheck: false, ..VmConfig::default() };
    let results = threeimp_cli::execute(demo, config).unwrap();
    assert_eq!(results.last().unwrap().as_integer(), Some(3_628_800));
}

#[test]
fn escaping_continuation_demo_produces_eleven_then_one_oh_one() {
    let demo = demos::find("escaping-continuation").unwrap();
    let results = threeimp_cli::execute(demo, VmConfig::default()).unwrap();
    assert_eq!(results[1].as_integer(), Some(11));
    assert_eq!(results[2].as_integer(), Some(101));
}

#[test]
fn dump_output_mentions_every_demo_by_name_in_the_instruction_count() {
    for demo in demos::DEMOS {
        let listing = threeimp_cli::dump(demo).unwrap();
        assert!(!listing.trim().is_empty(), "{} dumped an empty listing", demo.name);
    }
}
