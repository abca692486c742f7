//! Column statistics and transforms behind the cleaning session.
//!
//! Follows a fit/transform split: `fit_*` reads statistics from a frame,
//! `transform_*` applies them and returns a new frame.

use anyhow::{anyhow, Result};
use polars::prelude::*;
use std::collections::HashMap;

/// Statistics for MinMax scaling
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxStats {
    pub min: f64,
    pub max: f64,
}

/// Statistics for Standard scaling and z-scores
#[derive(Debug, Clone, PartialEq)]
pub struct StandardStats {
    pub mean: f64,
    pub std: f64,
}

/// Vocabulary for OneHot encoding, sorted
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotVocab {
    pub categories: Vec<String>,
}

fn float_column(df: &DataFrame, column: &str) -> Result<Float64Chunked> {
    let col = df
        .column(column)
        .map_err(|e| anyhow!("Column '{}' not found: {}", column, e))?;

    let float_col = col
        .cast(&DataType::Float64)
        .map_err(|e| anyhow!("Cannot cast column '{}' to float: {}", column, e))?;

    let ca = float_col
        .f64()
        .map_err(|e| anyhow!("Failed to get f64 chunked array: {}", e))?;

    Ok(ca.clone())
}

fn string_column(df: &DataFrame, column: &str) -> Result<StringChunked> {
    let col = df
        .column(column)
        .map_err(|e| anyhow!("Column '{}' not found: {}", column, e))?;

    let str_col = col
        .str()
        .map_err(|e| anyhow!("Column '{}' is not a string type: {}", column, e))?;

    Ok(str_col.clone())
}

/// Median over present values.
pub fn fit_median(df: &DataFrame, column: &str) -> Result<f64> {
    float_column(df, column)?
        .median()
        .ok_or_else(|| anyhow!("Column '{}' has no values", column))
}

/// Most frequent present value. Ties go to the value seen first.
pub fn fit_mode(df: &DataFrame, column: &str) -> Result<String> {
    let str_col = string_column(df, column)?;

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for val in str_col.into_iter().flatten() {
        let count = counts.entry(val).or_insert_with(|| {
            order.push(val);
            0
        });
        *count += 1;
    }

    let mut best: Option<(&str, u64)> = None;
    for val in order {
        let count = counts[val];
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((val, count)),
        }
    }

    best.map(|(val, _)| val.to_string())
        .ok_or_else(|| anyhow!("Column '{}' has no values", column))
}

/// Fill nulls of a numeric column with `value`.
pub fn impute_numeric(df: &DataFrame, column: &str, value: f64) -> Result<DataFrame> {
    df.clone()
        .lazy()
        .with_column(col(column).fill_null(lit(value)).alias(column))
        .collect()
        .map_err(|e| anyhow!("Failed to impute column '{}': {}", column, e))
}

/// Fill nulls of a string column with `value`.
pub fn impute_categorical(df: &DataFrame, column: &str, value: &str) -> Result<DataFrame> {
    df.clone()
        .lazy()
        .with_column(col(column).fill_null(lit(value)).alias(column))
        .collect()
        .map_err(|e| anyhow!("Failed to impute column '{}': {}", column, e))
}

/// Fit MinMax scaler on a column
pub fn fit_minmax(df: &DataFrame, column: &str) -> Result<MinMaxStats> {
    let ca = float_column(df, column)?;

    let min = ca
        .min()
        .ok_or_else(|| anyhow!("Column '{}' has no values", column))?;
    let max = ca
        .max()
        .ok_or_else(|| anyhow!("Column '{}' has no values", column))?;

    Ok(MinMaxStats { min, max })
}

/// Transform column using MinMax scaling
pub fn transform_minmax(df: &DataFrame, column: &str, stats: &MinMaxStats) -> Result<DataFrame> {
    let range = stats.max - stats.min;

    // Constant column maps to 0
    let scale_expr = if range == 0.0 {
        lit(0.0)
    } else {
        (col(column).cast(DataType::Float64) - lit(stats.min)) / lit(range)
    };

    df.clone()
        .lazy()
        .with_column(scale_expr.alias(column))
        .collect()
        .map_err(|e| anyhow!("Failed to apply MinMax transform: {}", e))
}

/// Fit mean and standard deviation. `ddof = 0` gives the population figure.
pub fn fit_standard(df: &DataFrame, column: &str, ddof: u8) -> Result<StandardStats> {
    let ca = float_column(df, column)?;

    let mean = ca
        .mean()
        .ok_or_else(|| anyhow!("Column '{}' has no values", column))?;
    let std = ca
        .std(ddof)
        .ok_or_else(|| anyhow!("Cannot compute std for column '{}'", column))?;

    Ok(StandardStats { mean, std })
}

/// Transform column using Standard scaling (z-score)
pub fn transform_standard(
    df: &DataFrame,
    column: &str,
    stats: &StandardStats,
) -> Result<DataFrame> {
    let scale_expr = if stats.std == 0.0 {
        lit(0.0)
    } else {
        (col(column).cast(DataType::Float64) - lit(stats.mean)) / lit(stats.std)
    };

    df.clone()
        .lazy()
        .with_column(scale_expr.alias(column))
        .collect()
        .map_err(|e| anyhow!("Failed to apply Standard transform: {}", e))
}

/// Raw z-scores of a column. A zero std yields NaN for every row.
pub fn zscores(df: &DataFrame, column: &str, stats: &StandardStats) -> Result<Vec<f64>> {
    let ca = float_column(df, column)?;
    Ok(ca
        .into_iter()
        .map(|v| match v {
            Some(v) => (v - stats.mean) / stats.std,
            None => f64::NAN,
        })
        .collect())
}

/// Row indices whose population z-score exceeds `threshold` in magnitude.
pub fn detect_outliers(df: &DataFrame, column: &str, threshold: f64) -> Result<Vec<usize>> {
    let stats = fit_standard(df, column, 0)?;
    let z = zscores(df, column, &stats)?;
    Ok(z
        .iter()
        .enumerate()
        .filter(|(_, z)| z.abs() > threshold)
        .map(|(i, _)| i)
        .collect())
}

/// Fit OneHot encoder on a column
pub fn fit_onehot(df: &DataFrame, column: &str) -> Result<OneHotVocab> {
    let str_col = string_column(df, column)?;

    let mut categories: Vec<String> = str_col
        .into_iter()
        .filter_map(|opt| opt.map(|s| s.to_string()))
        .collect();

    categories.sort();
    categories.dedup();

    Ok(OneHotVocab { categories })
}

/// Replace `column` with Int32 indicator columns named `<column>_<category>`.
/// With `drop_first` the first (reference) category gets no column.
pub fn transform_onehot(
    df: &DataFrame,
    column: &str,
    vocab: &OneHotVocab,
    drop_first: bool,
) -> Result<DataFrame> {
    let str_col = string_column(df, column)?;

    let mut result = df
        .drop(column)
        .map_err(|e| anyhow!("Failed to drop column '{}': {}", column, e))?;

    let skip = usize::from(drop_first);
    for category in vocab.categories.iter().skip(skip) {
        let col_name = format!("{}_{}", column, category);
        let values: Vec<i32> = str_col
            .into_iter()
            .map(|opt_val| match opt_val {
                Some(val) if val == category => 1,
                _ => 0,
            })
            .collect();

        let series = Series::new(col_name.into(), values);
        result
            .hstack_mut(&[series.into()])
            .map_err(|e| anyhow!("Failed to add one-hot column: {}", e))?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Imputation
    // ============================================================================

    #[test]
    fn test_fit_median_ignores_nulls() {
        let df = df! {
            "value" => &[Some(1.0), None, Some(3.0), Some(10.0), None]
        }
        .unwrap();
        assert_eq!(fit_median(&df, "value").unwrap(), 3.0);
    }

    #[test]
    fn test_fit_median_all_null_errors() {
        let df = df! {
            "value" => &[None::<f64>, None]
        }
        .unwrap();
        assert!(fit_median(&df, "value").is_err());
    }

    #[test]
    fn test_fit_mode() {
        let df = df! {
            "category" => &[Some("b"), Some("a"), None, Some("a"), None, None]
        }
        .unwrap();
        assert_eq!(fit_mode(&df, "category").unwrap(), "a");
    }

    #[test]
    fn test_fit_mode_tie_goes_to_first_seen() {
        let df = df! {
            "category" => &["dog", "cat", "cat", "dog", "bird"]
        }
        .unwrap();
        assert_eq!(fit_mode(&df, "category").unwrap(), "dog");
    }

    #[test]
    fn test_impute_leaves_no_nulls() {
        let df = df! {
            "value" => &[Some(1.0), None, Some(3.0)],
            "category" => &[None, Some("x"), Some("x")]
        }
        .unwrap();
        let df = impute_numeric(&df, "value", 2.0).unwrap();
        let df = impute_categorical(&df, "category", "x").unwrap();

        assert_eq!(df.column("value").unwrap().null_count(), 0);
        assert_eq!(df.column("category").unwrap().null_count(), 0);
        let values = df.column("value").unwrap().f64().unwrap();
        assert_eq!(values.get(1), Some(2.0));
        let cats = df.column("category").unwrap().str().unwrap();
        assert_eq!(cats.get(0), Some("x"));
    }

    // ============================================================================
    // MinMax Scaler Tests
    // ============================================================================

    #[test]
    fn test_fit_minmax() {
        let df = df! {
            "value" => &[10.0, 20.0, 30.0, 40.0, 50.0]
        }
        .unwrap();

        let stats = fit_minmax(&df, "value").unwrap();
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 50.0);
    }

    #[test]
    fn test_transform_minmax() {
        let df = df! {
            "value" => &[10.0, 20.0, 30.0, 40.0, 50.0]
        }
        .unwrap();

        let stats = MinMaxStats {
            min: 10.0,
            max: 50.0,
        };
        let result = transform_minmax(&df, "value", &stats).unwrap();

        let scaled = result.column("value").unwrap().f64().unwrap();
        assert!((scaled.get(0).unwrap() - 0.0).abs() < 1e-10);
        assert!((scaled.get(2).unwrap() - 0.5).abs() < 1e-10);
        assert!((scaled.get(4).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_minmax_integer_column() {
        let df = df! {
            "value" => &[2, 4, 6]
        }
        .unwrap();

        let stats = fit_minmax(&df, "value").unwrap();
        let result = transform_minmax(&df, "value", &stats).unwrap();
        let scaled = result.column("value").unwrap().f64().unwrap();
        assert_eq!(scaled.get(1), Some(0.5));
    }

    #[test]
    fn test_minmax_constant_column() {
        let df = df! {
            "value" => &[5.0, 5.0, 5.0]
        }
        .unwrap();

        let stats = fit_minmax(&df, "value").unwrap();
        let result = transform_minmax(&df, "value", &stats).unwrap();

        let scaled = result.column("value").unwrap().f64().unwrap();
        assert_eq!(scaled.len(), 3);
        assert!(scaled.into_iter().all(|v| v == Some(0.0)));
    }

    // ============================================================================
    // Standard Scaler / z-score Tests
    // ============================================================================

    #[test]
    fn test_fit_standard_population() {
        let df = df! {
            "value" => &[0.0, 10.0]
        }
        .unwrap();

        let stats = fit_standard(&df, "value", 0).unwrap();
        assert!((stats.mean - 5.0).abs() < 1e-10);
        assert!((stats.std - 5.0).abs() < 1e-10);

        let sample = fit_standard(&df, "value", 1).unwrap();
        assert!((sample.std - 7.0710678118654752).abs() < 1e-6);
    }

    #[test]
    fn test_transform_standard() {
        let df = df! {
            "value" => &[0.0, 5.0, 10.0]
        }
        .unwrap();

        let stats = StandardStats {
            mean: 5.0,
            std: 5.0,
        };
        let result = transform_standard(&df, "value", &stats).unwrap();

        let scaled = result.column("value").unwrap().f64().unwrap();
        assert!((scaled.get(0).unwrap() - (-1.0)).abs() < 1e-10);
        assert!((scaled.get(1).unwrap() - 0.0).abs() < 1e-10);
        assert!((scaled.get(2).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_detect_outliers() {
        let mut values = vec![0.0; 20];
        values.push(100.0);
        let df = df! { "value" => values }.unwrap();

        let rows = detect_outliers(&df, "value", 3.0).unwrap();
        assert_eq!(rows, vec![20]);
    }

    #[test]
    fn test_zero_variance_flags_nothing() {
        let df = df! { "value" => &[4.0, 4.0, 4.0] }.unwrap();
        let stats = fit_standard(&df, "value", 0).unwrap();
        let z = zscores(&df, "value", &stats).unwrap();
        assert!(z.iter().all(|v| v.is_nan()));
        assert!(detect_outliers(&df, "value", 3.0).unwrap().is_empty());
    }

    // ============================================================================
    // OneHot Encoder Tests
    // ============================================================================

    #[test]
    fn test_fit_onehot() {
        let df = df! {
            "category" => &[Some("cat"), Some("dog"), None, Some("bird"), Some("cat")]
        }
        .unwrap();

        let vocab = fit_onehot(&df, "category").unwrap();
        assert_eq!(vocab.categories, vec!["bird", "cat", "dog"]);
    }

    #[test]
    fn test_transform_onehot_drop_first() {
        let df = df! {
            "id" => &[1, 2, 3],
            "category" => &["cat", "dog", "bird"]
        }
        .unwrap();

        let vocab = fit_onehot(&df, "category").unwrap();
        let result = transform_onehot(&df, "category", &vocab, true).unwrap();

        // k categories -> k - 1 indicators, source column removed
        assert_eq!(result.width(), 3);
        assert!(result.column("category").is_err());
        assert!(result.column("category_bird").is_err());

        let cat_col = result.column("category_cat").unwrap().i32().unwrap();
        assert_eq!(cat_col.get(0), Some(1)); // "cat"
        assert_eq!(cat_col.get(1), Some(0)); // "dog"
        assert_eq!(cat_col.get(2), Some(0)); // "bird"

        let dog_col = result.column("category_dog").unwrap().i32().unwrap();
        assert_eq!(dog_col.get(1), Some(1));
    }

    #[test]
    fn test_transform_onehot_keep_all() {
        let df = df! {
            "category" => &["a", "b", "a"]
        }
        .unwrap();

        let vocab = fit_onehot(&df, "category").unwrap();
        let result = transform_onehot(&df, "category", &vocab, false).unwrap();
        assert_eq!(result.width(), 2);
        assert!(result.column("category_a").is_ok());
        assert!(result.column("category_b").is_ok());
    }
}
