//! Unit tests for the in-memory parts of nctoolbox
//!
//! Request resolution, time decoding, table operations, resampling,
//! equations and configuration.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use ndarray::{arr1, arr2, ArrayD, IxDyn};
use nctoolbox::{
    equations::{droplet_number, droplet_number_array, gamma_ad, gamma_ad_default, qsatw},
    extract::has_time_axis,
    metadata::{format_variable_table, MetaValue, VariableDescriptor},
    parallel::ParallelConfig,
    resolver::{resolve, Diagnostic, Resolution, VarRequest},
    table::{concat, parse_interval, Reducer, TimeTable},
    time::{decode_times, encode_seconds_since_epoch, start_of_day, TimeUnits, EPOCH_UNITS},
    Result, ToolboxError,
};

fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2014, 3, day)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .expect("valid test datetime")
}

fn met_keys() -> Vec<String> {
    ["atmos_pressure", "rh_mean", "temp_mean", "temp_std", "time"]
        .iter()
        .map(|k| (*k).to_string())
        .collect()
}

fn column(values: &[f64]) -> ArrayD<f64> {
    arr1(values).into_dyn()
}

fn hourly_table(hours: &[u32], values: &[f64]) -> Result<TimeTable> {
    let index = hours.iter().map(|&h| at(15, h, 0, 0)).collect();
    TimeTable::new(index).with_column("temp", column(values))
}

#[test]
fn test_error_types() {
    let not_found = ToolboxError::NotFound {
        path: "missing.cdf".into(),
    };
    assert_eq!(not_found.to_string(), "File missing.cdf could not be found");

    let var_err = ToolboxError::VariableError("varlist not supplied".to_string());
    assert_eq!(var_err.to_string(), "Error: varlist not supplied");

    let no_match = ToolboxError::NoMatch {
        tokens: vec!["foo".to_string(), "bar".to_string()],
    };
    assert!(no_match.to_string().contains("foo, bar"));

    let invalid = ToolboxError::invalid_argument("ext", "bad extension");
    assert!(matches!(invalid, ToolboxError::InvalidArgument { .. }));
    assert!(invalid.to_string().contains("bad extension"));
}

#[test]
fn test_resolve_exact_match_wins_over_substring() -> Result<()> {
    let resolution = resolve(&VarRequest::from("temp_mean"), &met_keys(), false)?;
    assert_eq!(resolution.names(), ["temp_mean"]);
    assert!(resolution.diagnostics().is_empty());
    Ok(())
}

#[test]
fn test_resolve_substring_matches_in_key_order() -> Result<()> {
    let resolution = resolve(&VarRequest::from("temp"), &met_keys(), false)?;
    assert_eq!(resolution.names(), ["temp_mean", "temp_std"]);
    Ok(())
}

#[test]
fn test_resolve_preserves_token_order_and_deduplicates() -> Result<()> {
    let request = VarRequest::from(["time", "temp", "temp_mean", "atmos"]);
    let resolution = resolve(&request, &met_keys(), false)?;
    assert_eq!(
        resolution.names(),
        ["time", "temp_mean", "temp_std", "atmos_pressure"]
    );
    Ok(())
}

#[test]
fn test_resolve_reports_unmatched_tokens() -> Result<()> {
    let resolution = resolve(&VarRequest::from(["rh", "foo"]), &met_keys(), false)?;
    assert_eq!(resolution.names(), ["rh_mean"]);
    assert_eq!(
        resolution.diagnostics(),
        [Diagnostic::UnmatchedToken {
            token: "foo".to_string()
        }]
    );
    assert_eq!(
        resolution.diagnostics()[0].to_string(),
        "foo not found in varlist"
    );
    Ok(())
}

#[test]
fn test_resolve_no_match_is_an_error() {
    let result = resolve(&VarRequest::from(["foo"]), &met_keys(), false);
    match result {
        Err(ToolboxError::NoMatch { tokens }) => assert_eq!(tokens, ["foo"]),
        other => panic!("expected NoMatch, got {other:?}"),
    }
}

#[test]
fn test_resolve_tolerated_empty_result() -> Result<()> {
    let resolution = resolve(&VarRequest::from("foo"), &met_keys(), true)?;
    assert!(resolution.is_empty());
    assert!(resolution.names().is_empty());
    assert!(matches!(resolution, Resolution::Empty { ref diagnostics } if diagnostics.len() == 1));
    Ok(())
}

#[test]
fn test_request_validation() {
    let empty = VarRequest::Many(Vec::new());
    assert!(matches!(
        resolve(&empty, &met_keys(), true),
        Err(ToolboxError::VariableError(_))
    ));

    let blank = VarRequest::from(["temp", ""]);
    assert!(matches!(
        blank.validate(),
        Err(ToolboxError::InvalidArgument { .. })
    ));

    assert_eq!(VarRequest::from("rh").tokens(), ["rh"]);
    assert!(VarRequest::from(vec!["a".to_string(), "b".to_string()])
        .validate()
        .is_ok());
}

#[test]
fn test_has_time_axis() {
    let all_timed = vec![vec!["time"], vec!["time", "height"]];
    assert!(has_time_axis(true, &all_timed));
    assert!(!has_time_axis(false, &all_timed));

    let mixed = vec![vec!["time"], vec![]];
    assert!(!has_time_axis(true, &mixed));

    let transposed = vec![vec!["height", "time"]];
    assert!(has_time_axis(true, &transposed));
}

#[test]
fn test_decode_arm_style_units() -> Result<()> {
    let times = decode_times(&[0.0, 60.0, 3600.5], "seconds since 2014-03-15 00:00:00 0:00", None)?;
    assert_eq!(times[0], at(15, 0, 0, 0));
    assert_eq!(times[1], at(15, 0, 1, 0));
    assert_eq!(times[2], at(15, 1, 0, 0) + Duration::milliseconds(500));
    Ok(())
}

#[test]
fn test_decode_other_unit_forms() -> Result<()> {
    let hours = decode_times(&[24.0], "hours since 1900-01-01 00:00:00.0", Some("gregorian"))?;
    let expected = NaiveDate::from_ymd_opt(1900, 1, 2)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date");
    assert_eq!(hours, [expected]);

    let iso = decode_times(&[1.5], "days since 2014-03-14T00:00:00Z", None)?;
    assert_eq!(iso, [at(15, 12, 0, 0)]);

    let date_only = decode_times(&[90.0], "minutes since 2014-03-15", Some("standard"))?;
    assert_eq!(date_only, [at(15, 1, 30, 0)]);
    Ok(())
}

#[test]
fn test_decode_applies_timezone_offset() -> Result<()> {
    let units = TimeUnits::parse("seconds since 2014-03-15 06:00:00 +06:00")?;
    assert_eq!(units.reference, at(15, 0, 0, 0));
    assert_eq!(units.unit_micros, 1_000_000);
    Ok(())
}

#[test]
fn test_decode_errors() {
    assert!(matches!(
        decode_times(&[0.0], "furlongs since 2014-03-15", None),
        Err(ToolboxError::TimeDecode { .. })
    ));
    assert!(matches!(
        decode_times(&[0.0], "seconds after 2014-03-15", None),
        Err(ToolboxError::TimeDecode { .. })
    ));
    assert!(matches!(
        decode_times(&[0.0], "seconds since 2014-03-15", Some("noleap")),
        Err(ToolboxError::TimeDecode { .. })
    ));
    assert!(matches!(
        decode_times(&[f64::NAN], "seconds since 2014-03-15", None),
        Err(ToolboxError::TimeDecode { .. })
    ));
}

#[test]
fn test_decode_rejects_non_ascii_timezone() {
    for units in [
        "seconds since 2014-03-15 00:00:00 +a\u{e9}b",
        "seconds since 2014-03-15 00:00:00 \u{e9}\u{e9}",
        "seconds since 2014-03-15 00:00:00 +0\u{b0}30",
    ] {
        assert!(
            matches!(
                decode_times(&[0.0], units, None),
                Err(ToolboxError::TimeDecode { .. })
            ),
            "'{units}' should be rejected"
        );
    }
}

#[test]
fn test_epoch_encoding_matches_store_units() -> Result<()> {
    let times = vec![at(15, 0, 0, 0), at(15, 13, 45, 30)];
    let seconds = encode_seconds_since_epoch(&times);
    assert_eq!(seconds[0], 1_394_841_600.0);
    assert_eq!(decode_times(&seconds, EPOCH_UNITS, None)?, times);
    assert_eq!(start_of_day(times[1]), times[0]);
    Ok(())
}

#[test]
fn test_table_column_checks() -> Result<()> {
    let table = hourly_table(&[0, 1, 2], &[1.0, 2.0, 3.0])?;
    assert_eq!(table.n_rows(), 3);
    assert_eq!(table.column_names(), ["temp"]);

    let short = table.clone().with_column("rh", column(&[1.0, 2.0]));
    assert!(matches!(short, Err(ToolboxError::ShapeMismatch(_))));

    let duplicate = table.clone().with_column("temp", column(&[1.0, 2.0, 3.0]));
    assert!(matches!(duplicate, Err(ToolboxError::InvalidArgument { .. })));

    let scalar = table.with_column("lat", ArrayD::from_elem(IxDyn(&[]), 36.6));
    assert!(matches!(scalar, Err(ToolboxError::ShapeMismatch(_))));
    Ok(())
}

#[test]
fn test_concat_unions_columns_and_fills_missing() -> Result<()> {
    let first = hourly_table(&[0, 1], &[10.0, 11.0])?;
    let second = hourly_table(&[2, 3], &[12.0, 13.0])?;
    let third = hourly_table(&[4, 5], &[14.0, 15.0])?.with_column("rh", column(&[50.0, 51.0]))?;

    let combined = concat(&[first, second, third])?;
    assert_eq!(combined.n_rows(), 6);
    assert_eq!(combined.column_names(), ["temp", "rh"]);
    assert_eq!(combined.index()[5], at(15, 5, 0, 0));

    let temp = combined.column("temp").expect("temp column");
    assert_eq!(temp[[3]], 13.0);

    let rh = combined.column("rh").expect("rh column");
    assert!(rh.iter().take(4).all(|v| v.is_nan()));
    assert_eq!(rh[[4]], 50.0);
    assert_eq!(rh[[5]], 51.0);
    Ok(())
}

#[test]
fn test_concat_rejects_conflicting_row_shapes() -> Result<()> {
    let scalar = hourly_table(&[0], &[1.0])?;
    let profile = TimeTable::new(vec![at(15, 1, 0, 0)])
        .with_column("temp", arr2(&[[1.0, 2.0]]).into_dyn())?;

    let result = concat(&[scalar, profile]);
    assert!(matches!(result, Err(ToolboxError::Aggregation { .. })));
    Ok(())
}

#[test]
fn test_resample_six_hour_mean() -> Result<()> {
    let hours: Vec<u32> = (0..24).collect();
    let values: Vec<f64> = (0..24).map(f64::from).collect();
    let table = hourly_table(&hours, &values)?;

    let resampled = table.resample(Duration::hours(6), Reducer::Mean)?;
    assert_eq!(
        resampled.index(),
        [at(15, 0, 0, 0), at(15, 6, 0, 0), at(15, 12, 0, 0), at(15, 18, 0, 0)]
    );
    let temp = resampled.column("temp").expect("temp column");
    assert_eq!(temp.as_slice(), Some(&[2.5, 8.5, 14.5, 20.5][..]));
    Ok(())
}

#[test]
fn test_resample_emits_empty_buckets() -> Result<()> {
    let table = hourly_table(&[1, 13], &[4.0, 8.0])?;

    let mean = table.resample(Duration::hours(6), Reducer::Mean)?;
    assert_eq!(mean.n_rows(), 3);
    assert_eq!(mean.index()[0], at(15, 0, 0, 0));
    let temp = mean.column("temp").expect("temp column");
    assert_eq!(temp[[0]], 4.0);
    assert!(temp[[1]].is_nan());
    assert_eq!(temp[[2]], 8.0);

    let sum = table.resample(Duration::hours(6), Reducer::Sum)?;
    assert_eq!(sum.column("temp").expect("temp column")[[1]], 0.0);
    Ok(())
}

#[test]
fn test_resample_reducers_skip_missing_values() -> Result<()> {
    let table = hourly_table(&[0, 1, 2, 3], &[f64::NAN, 3.0, 1.0, 2.0])?;
    let reduce = |reducer| -> Result<f64> {
        let out = table.resample(Duration::hours(6), reducer)?;
        Ok(out.column("temp").expect("temp column")[[0]])
    };

    assert_eq!(reduce(Reducer::Mean)?, 2.0);
    assert_eq!(reduce(Reducer::Sum)?, 6.0);
    assert_eq!(reduce(Reducer::Min)?, 1.0);
    assert_eq!(reduce(Reducer::Max)?, 3.0);
    assert_eq!(reduce(Reducer::First)?, 3.0);
    assert_eq!(reduce(Reducer::Last)?, 2.0);
    Ok(())
}

#[test]
fn test_resample_profile_columns() -> Result<()> {
    let profile = arr2(&[[1.0, 10.0], [3.0, 30.0], [5.0, 50.0]]).into_dyn();
    let table = TimeTable::new(vec![at(15, 0, 0, 0), at(15, 0, 30, 0), at(15, 1, 10, 0)])
        .with_column("backscatter", profile)?;

    let resampled = table.resample(Duration::hours(1), Reducer::Mean)?;
    let column = resampled.column("backscatter").expect("backscatter column");
    assert_eq!(column.shape(), &[2, 2]);
    assert_eq!(column[[0, 0]], 2.0);
    assert_eq!(column[[0, 1]], 20.0);
    assert_eq!(column[[1, 1]], 50.0);
    Ok(())
}

#[test]
fn test_reducer_parsing() {
    assert_eq!("MEAN".parse::<Reducer>(), Ok(Reducer::Mean));
    assert_eq!("sum".parse::<Reducer>(), Ok(Reducer::Sum));
    assert_eq!("last".parse::<Reducer>(), Ok(Reducer::Last));
    assert!("median".parse::<Reducer>().is_err());
    assert_eq!(Reducer::default(), Reducer::Mean);
    assert_eq!(Reducer::Max.as_str(), "max");
}

#[test]
fn test_parse_interval() -> Result<()> {
    assert_eq!(parse_interval("6 hours")?, Duration::hours(6));
    assert_eq!(parse_interval("1 hour")?, Duration::hours(1));
    assert_eq!(parse_interval("6h")?, Duration::hours(6));
    assert_eq!(parse_interval("30min")?, Duration::minutes(30));

    for bad in ["", "0s", "soon"] {
        assert!(
            matches!(parse_interval(bad), Err(ToolboxError::InvalidArgument { .. })),
            "'{bad}' should be rejected"
        );
    }
    Ok(())
}

#[test]
fn test_saturation_humidity() {
    // At the triple point the saturation vapour pressure is about 611 Pa
    let q = qsatw(273.16, 100_000.0);
    assert!((q - 0.003822).abs() < 1e-5, "qsatw = {q}");
    assert!(qsatw(300.0, 100_000.0) > q);
}

#[test]
fn test_adiabatic_condensation_rate() {
    let g = gamma_ad_default(280.0);
    assert!(g > 1.0e-6 && g < 3.0e-6, "gamma_ad = {g}");
    assert_eq!(g, gamma_ad(280.0, 900.0));
    assert!(gamma_ad(290.0, 900.0) > g);
}

#[test]
fn test_droplet_number() -> Result<()> {
    let gamma = 2.0e-6;
    assert!(droplet_number(gamma, 1.0, 0.0, 10.0e-6).is_nan());
    assert!(droplet_number(gamma, 1.0, 0.1, 0.0).is_nan());

    let thin = droplet_number(gamma, 1.0, 0.05, 10.0e-6);
    let thick = droplet_number(gamma, 1.0, 0.2, 10.0e-6);
    assert!(thin.is_finite() && thin > 0.0);
    assert!(thick > thin);

    let lwp = column(&[0.05, 0.0]);
    let re = column(&[10.0e-6, 8.0e-6]);
    let n = droplet_number_array(gamma, 1.0, &lwp, &re)?;
    assert_eq!(n[[0]], thin);
    assert!(n[[1]].is_nan());

    let mismatched = droplet_number_array(gamma, 1.0, &lwp, &column(&[1.0e-5]));
    assert!(matches!(mismatched, Err(ToolboxError::ShapeMismatch(_))));
    Ok(())
}

#[test]
fn test_variable_table_marks_unknown_metadata() {
    let descriptors = vec![
        VariableDescriptor {
            name: "temp_mean".to_string(),
            long_name: MetaValue::Known("Temperature mean".to_string()),
            units: MetaValue::Known("degC".to_string()),
            dimensions: vec!["time".to_string()],
        },
        VariableDescriptor {
            name: "qc_temp".to_string(),
            long_name: MetaValue::Unknown,
            units: MetaValue::Unknown,
            dimensions: vec!["time".to_string(), "bound".to_string()],
        },
    ];

    let table = format_variable_table(&descriptors);
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[1].contains("Long Name"));
    assert!(lines[3].contains("Temperature mean") && lines[3].contains("(time)"));
    assert!(lines[4].contains("None") && lines[4].contains("(time, bound)"));
    assert!(lines.iter().all(|l| l.chars().count() == lines[0].chars().count()));

    assert!(descriptors[1].has_dimension("bound"));
    assert!(descriptors[0].long_name.is_known());
    assert_eq!(descriptors[1].units.to_string(), "None");
}

#[test]
fn test_parallel_config() {
    let config = ParallelConfig::default();
    assert!(config.num_threads.is_none());

    let config = ParallelConfig::with_threads(4);
    assert_eq!(config.num_threads, Some(4));

    let config = ParallelConfig::all_cores();
    assert!(config.num_threads.unwrap_or(0) >= 1);
    assert!(config.current_threads() >= 1);
}

#[test]
fn test_resolve_is_idempotent() -> Result<()> {
    let request = VarRequest::from(["mean", "pressure", "foo"]);
    let first = resolve(&request, &met_keys(), false)?;
    let second = resolve(&request, &met_keys(), false)?;
    assert_eq!(first, second);
    assert_eq!(first.names(), ["rh_mean", "temp_mean", "atmos_pressure"]);
    Ok(())
}
