use anyhow::Result;
use prepbench::features::{fit_standard, zscores};
use prepbench::generate::{self, SALARY};
use prepbench::io::PersistedCsv;
use prepbench::session::{CleaningSession, NormalizationMethod, OutlierAction, OutlierMethod};

/// 1,000 rows, seed 42: imputation, z-score moments and outlier count
#[test]
fn test_end_to_end_scenario() -> Result<()> {
    let mut df = generate::generate(1_000, 42)?;
    assert!(df.column("age")?.null_count() > 0);
    let dataset = PersistedCsv::new(&mut df)?;

    let mut session = CleaningSession::new();
    session.load_data(dataset.path())?.imputation()?;
    let imputed = session.get_data()?;
    for column in imputed.get_columns() {
        assert_eq!(column.null_count(), 0, "{} still has nulls", column.name());
    }

    session
        .normalization(NormalizationMethod::MinMax)?
        .one_hot_encoding(&["dept"])?;
    let encoded = session.get_data()?;

    let stats = fit_standard(&encoded, SALARY, 0)?;
    let z = zscores(&encoded, SALARY, &stats)?;
    let n = z.len() as f64;
    let mean = z.iter().sum::<f64>() / n;
    let var = z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    assert!(mean.abs() < 1e-9, "mean of z was {}", mean);
    assert!((var.sqrt() - 1.0).abs() < 1e-9, "std of z was {}", var.sqrt());

    session.outlier(OutlierMethod::default(), OutlierAction::Detect)?;
    let salary = session
        .outliers()
        .iter()
        .find(|s| s.column == SALARY)
        .expect("salary summary");
    let expected = z.iter().filter(|v| v.abs() > 3.0).count();
    assert_eq!(salary.rows.len(), expected);
    // log-normal right tail, roughly 1.5% of rows
    assert!(salary.rows.len() < 40, "{} outliers", salary.rows.len());

    // detection left the table alone
    assert!(session.get_data()?.equals(&encoded));
    Ok(())
}
