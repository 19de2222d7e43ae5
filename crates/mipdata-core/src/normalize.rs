//! Normalization of scraped metadata tables into the canonical schema.
//!
//! Each library family publishes a differently shaped table, so the
//! transformation is dispatched on [`Family`]. Only MIPLIB is implemented;
//! other families fail with [`Error::NotImplemented`].

use tracing::debug;

use crate::error::{Error, Result};
use crate::instance::{Format, Instance, OptimizationStatus, ProblemType, Status};
use crate::library::{Family, Library};
use crate::table::{CacheRow, RawTable};

/// Marker the MIPLIB site appends to objective values that are feasible
/// but not proven optimal.
const FEASIBLE_MARKER: char = '*';

/// MIPLIB header names, in the order they are read.
mod miplib {
    pub const NAME: &str = "Instance";
    pub const STATUS: &str = "Status";
    pub const VARIABLES: &str = "Variables";
    pub const BINARIES: &str = "Binaries";
    pub const INTEGERS: &str = "Integers";
    pub const CONTINUOUS: &str = "Continuous";
    pub const CONSTRAINTS: &str = "Constraints";
    pub const NONZEROS: &str = "Nonz.";
    pub const GROUP: &str = "Group";
    pub const OBJECTIVE: &str = "Objective";
    pub const TAGS: &str = "Tags";
}

/// Whether tables and artifacts of `library` can be processed.
pub fn supports(library: Library) -> bool {
    library.family() == Family::Miplib
}

/// Transform a scraped table into canonical cache rows.
pub fn normalize(library: Library, table: &RawTable) -> Result<Vec<CacheRow>> {
    match library.family() {
        Family::Miplib => normalize_miplib(table),
        Family::Minlplib | Family::Qplib => Err(Error::NotImplemented(library)),
    }
}

/// Build the in-memory record for a cached row.
pub fn build_instance(library: Library, row: &CacheRow) -> Result<Instance> {
    match library.family() {
        Family::Miplib => Ok(build_miplib_instance(library, row)),
        Family::Minlplib | Family::Qplib => Err(Error::NotImplemented(library)),
    }
}

fn normalize_miplib(table: &RawTable) -> Result<Vec<CacheRow>> {
    let name = table.column_index(miplib::NAME)?;
    let status = table.column_index(miplib::STATUS)?;
    let n_vars = table.column_index(miplib::VARIABLES)?;
    let n_bins = table.column_index(miplib::BINARIES)?;
    let n_ints = table.column_index(miplib::INTEGERS)?;
    let n_conts = table.column_index(miplib::CONTINUOUS)?;
    let n_cons = table.column_index(miplib::CONSTRAINTS)?;
    let n_nz = table.column_index(miplib::NONZEROS)?;
    let group = table.column_index(miplib::GROUP)?;
    let objective = table.column_index(miplib::OBJECTIVE)?;
    let tags = table.column_index(miplib::TAGS)?;

    let mut rows = Vec::with_capacity(table.len());
    for i in 0..table.len() {
        let row_name = table.cell(i, name);
        let count = |column: usize, label: &'static str| parse_count(table.cell(i, column), label, row_name);

        let n_vars = count(n_vars, "n_vars")?;
        let n_bins = count(n_bins, "n_bins")?;
        let n_ints = count(n_ints, "n_ints")?;
        let n_conts = count(n_conts, "n_conts")?;
        let status_text = table.cell(i, status);
        let (optimization_status, primal) = decode_objective(status_text, table.cell(i, objective));
        let group_text = table.cell(i, group);

        rows.push(CacheRow {
            name: row_name.to_owned(),
            status: status_text.to_owned(),
            n_vars,
            n_bins,
            n_ints,
            n_conts,
            n_cons: count(n_cons, "n_cons")?,
            n_nz: count(n_nz, "n_nz")?,
            group: (!group_text.is_empty()).then(|| group_text.to_owned()),
            primal,
            tags: table.cell(i, tags).to_owned(),
            problem_type: ProblemType::classify(n_vars, n_bins, n_ints, n_conts),
            optimization_status,
        });
    }

    debug!("Normalized {} MIPLIB rows", rows.len());
    Ok(rows)
}

/// Parse a non-negative count cell, tolerating thousands separators.
fn parse_count(text: &str, column: &'static str, row: &str) -> Result<u64> {
    let digits: String = text.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    digits.parse().map_err(|_| Error::InvalidValue {
        column,
        row: row.to_owned(),
        value: text.to_owned(),
    })
}

/// Decode the free-text objective cell together with the status cell.
///
/// - `unbounded` / `infeasible` anywhere in the objective (any case) decide
///   the status and carry no bound;
/// - an open instance with a trailing `*` on its objective is FEASIBLE;
/// - an open instance without the marker stays UNKNOWN with no bound;
/// - every other instance is OPTIMAL.
///
/// The bound is the objective with markers stripped, or `None` when that
/// residue is not a number. A missing status cell counts as open.
pub fn decode_objective(status: &str, objective: &str) -> (OptimizationStatus, Option<f64>) {
    let objective = objective.trim();
    let lowered = objective.to_ascii_lowercase();
    let unbounded = lowered.contains(OptimizationStatus::Unbounded.as_str());
    let infeasible = lowered.contains(OptimizationStatus::Infeasible.as_str());
    let is_open = status.trim().is_empty() || status.to_ascii_lowercase().contains(Status::Open.as_str());
    let feasible = is_open && objective.ends_with(FEASIBLE_MARKER);
    let optimal = !(is_open || unbounded || infeasible);

    let decoded = if feasible {
        OptimizationStatus::Feasible
    } else if infeasible {
        OptimizationStatus::Infeasible
    } else if unbounded {
        OptimizationStatus::Unbounded
    } else if optimal {
        OptimizationStatus::Optimal
    } else {
        OptimizationStatus::Unknown
    };

    let bound = if feasible || optimal {
        parse_bound(objective)
    } else {
        None
    };
    (decoded, bound)
}

fn parse_bound(objective: &str) -> Option<f64> {
    objective
        .trim_end_matches(FEASIBLE_MARKER)
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
}

/// Split a tag cell into tags, keeping quoted multi-word tags together.
///
/// Cells with unbalanced quotes fall back to plain whitespace splitting.
pub fn parse_tags(text: &str) -> Vec<String> {
    let tokens = shlex::split(text)
        .unwrap_or_else(|| text.split_whitespace().map(str::to_owned).collect());
    tokens
        .into_iter()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect()
}

fn build_miplib_instance(library: Library, row: &CacheRow) -> Instance {
    let status = Status::parse_cell(&row.status);
    if status.is_none() && !row.status.is_empty() {
        debug!("Unrecognized status {:?} for {}", row.status, row.name);
    }

    // MIPLIB reports a single objective value. It doubles as the dual bound
    // and downstream code relies on `dual == primal` for these records.
    let primal = row.primal.filter(|_| row.optimization_status.has_bound());

    Instance {
        library,
        name: row.name.clone(),
        path: None,
        problem_type: row.problem_type,
        status,
        optimization_status: row.optimization_status,
        primal,
        dual: primal,
        n_vars: row.n_vars,
        n_bins: row.n_bins,
        n_ints: row.n_ints,
        n_conts: row.n_conts,
        n_cons: row.n_cons,
        n_nz: row.n_nz,
        n_sos: None,
        n_semi: None,
        n_quads: None,
        q0_density: None,
        q0_ev_prob: None,
        obj_type: None,
        var_type: None,
        cons_type: None,
        group: row.group.clone(),
        tags: parse_tags(&row.tags),
        formats: vec![Format::Mps],
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) const HEADERS: [&str; 12] = [
        "Instance",
        "Status",
        "Variables",
        "Binaries",
        "Integers",
        "Continuous",
        "Constraints",
        "Nonz.",
        "Submitter",
        "Group",
        "Objective",
        "Tags",
    ];

    pub(crate) fn miplib_table(rows: &[[&str; 12]]) -> RawTable {
        RawTable::new(
            HEADERS.iter().map(|h| (*h).to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_decode_documented_cases() {
        assert_eq!(
            decode_objective("open", "-12.5*"),
            (OptimizationStatus::Feasible, Some(-12.5))
        );
        assert_eq!(
            decode_objective("easy", "unbounded"),
            (OptimizationStatus::Unbounded, None)
        );
        assert_eq!(
            decode_objective("easy", "Infeasible"),
            (OptimizationStatus::Infeasible, None)
        );
        assert_eq!(
            decode_objective("hard", "42.0"),
            (OptimizationStatus::Optimal, Some(42.0))
        );
        assert_eq!(decode_objective("open", "-"), (OptimizationStatus::Unknown, None));
    }

    #[test]
    fn test_decode_open_is_case_insensitive_and_substring() {
        assert_eq!(
            decode_objective("Open (new)", "3.5*"),
            (OptimizationStatus::Feasible, Some(3.5))
        );
        assert_eq!(decode_objective("OPEN", "3.5"), (OptimizationStatus::Unknown, None));
    }

    #[test]
    fn test_decode_missing_status_counts_as_open() {
        assert_eq!(decode_objective("", "7"), (OptimizationStatus::Unknown, None));
        assert_eq!(decode_objective("", "7*"), (OptimizationStatus::Feasible, Some(7.0)));
    }

    #[test]
    fn test_decode_non_numeric_residue_is_missing() {
        assert_eq!(decode_objective("easy", "n/a"), (OptimizationStatus::Optimal, None));
        assert_eq!(decode_objective("easy", ""), (OptimizationStatus::Optimal, None));
        assert_eq!(decode_objective("easy", "nan"), (OptimizationStatus::Optimal, None));
    }

    #[test]
    fn test_decode_marker_on_closed_instance_is_stripped() {
        assert_eq!(
            decode_objective("easy", "1e3*"),
            (OptimizationStatus::Optimal, Some(1000.0))
        );
    }

    #[test]
    fn test_parse_tags_keeps_quoted_tags_together() {
        assert_eq!(
            parse_tags(r#"benchmark "set covering" binary"#),
            vec!["benchmark", "set covering", "binary"]
        );
        assert_eq!(parse_tags("  "), Vec::<String>::new());
        assert_eq!(parse_tags(r#"a "" b"#), vec!["a", "b"]);
        assert_eq!(parse_tags(r#"unbalanced "quote"#), vec!["unbalanced", "\"quote"]);
    }

    #[test]
    fn test_normalize_miplib_rows() {
        let table = miplib_table(&[
            [
                "air05", "easy", "7195", "7195", "0", "0", "426", "52121", "Bixby", "air",
                "26374", "benchmark binary",
            ],
            [
                "markshare_4_0", "open", "34", "30", "0", "4", "4", "123", "", "", "1*",
                "benchmark",
            ],
            [
                "big", "hard", "1,200", "0", "200", "1,000", "10", "5", "", "", "infeasible",
                "",
            ],
        ]);

        let rows = normalize(Library::MiplibBenchmark, &table).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].name, "air05");
        assert_eq!(rows[0].problem_type, ProblemType::Blp);
        assert_eq!(rows[0].optimization_status, OptimizationStatus::Optimal);
        assert_eq!(rows[0].primal, Some(26374.0));
        assert_eq!(rows[0].group.as_deref(), Some("air"));

        assert_eq!(rows[1].problem_type, ProblemType::Mblp);
        assert_eq!(rows[1].optimization_status, OptimizationStatus::Feasible);
        assert_eq!(rows[1].primal, Some(1.0));
        assert_eq!(rows[1].group, None);

        assert_eq!(rows[2].n_vars, 1200);
        assert_eq!(rows[2].problem_type, ProblemType::Milp);
        assert_eq!(rows[2].optimization_status, OptimizationStatus::Infeasible);
        assert_eq!(rows[2].primal, None);
    }

    #[test]
    fn test_normalize_fails_on_missing_column() {
        let mut table = miplib_table(&[]);
        table.headers.retain(|h| h != "Nonz.");
        let err = normalize(Library::MiplibCollection, &table).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column } if column == "Nonz."));
    }

    #[test]
    fn test_normalize_rejects_garbage_counts() {
        let table = miplib_table(&[[
            "x", "easy", "many", "0", "0", "0", "1", "1", "", "", "0", "",
        ]]);
        let err = normalize(Library::MiplibBenchmark, &table).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { column: "n_vars", .. }));
    }

    #[test]
    fn test_other_families_are_not_implemented() {
        let table = miplib_table(&[]);
        assert!(matches!(
            normalize(Library::Qplib, &table),
            Err(Error::NotImplemented(Library::Qplib))
        ));
    }

    #[test]
    fn test_build_instance_mirrors_primal_into_dual() {
        let table = miplib_table(&[[
            "air05", "easy", "7195", "7195", "0", "0", "426", "52121", "", "", "26374",
            r#"benchmark "set covering""#,
        ]]);
        let row = &normalize(Library::MiplibBenchmark, &table).unwrap()[0];
        let instance = build_instance(Library::MiplibBenchmark, row).unwrap();

        assert_eq!(instance.primal, Some(26374.0));
        assert_eq!(instance.dual, instance.primal);
        assert_eq!(instance.status, Some(Status::Easy));
        assert_eq!(instance.tags, vec!["benchmark", "set covering"]);
        assert_eq!(instance.formats, vec![Format::Mps]);
        assert!(instance.path.is_none());
    }

    #[test]
    fn test_build_instance_drops_bound_without_known_status() {
        let row = CacheRow {
            name: "odd".into(),
            status: "open".into(),
            n_vars: 1,
            n_bins: 0,
            n_ints: 0,
            n_conts: 1,
            n_cons: 1,
            n_nz: 1,
            group: None,
            primal: Some(5.0),
            tags: String::new(),
            problem_type: ProblemType::Lp,
            optimization_status: OptimizationStatus::Unknown,
        };
        let instance = build_instance(Library::MiplibBenchmark, &row).unwrap();
        assert_eq!(instance.primal, None);
        assert_eq!(instance.dual, None);
    }

    proptest! {
        #[test]
        fn bound_only_with_optimal_or_feasible(
            status in prop::sample::select(vec!["easy", "hard", "open", "Open", ""]),
            objective in "(-?[0-9]{1,4}(\\.[0-9]{1,2})?\\*?|unbounded|INFEASIBLE|-)",
        ) {
            let (decoded, bound) = decode_objective(status, &objective);
            if bound.is_some() {
                prop_assert!(decoded.has_bound());
            }
        }

        #[test]
        fn tags_never_contain_blank_entries(text in "[a-z \"]{0,30}") {
            for tag in parse_tags(&text) {
                prop_assert!(!tag.trim().is_empty());
            }
        }
    }
}
