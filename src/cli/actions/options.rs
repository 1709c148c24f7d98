use crate::catalog::OptionKind;
use std::fmt::Write;

/// Accepted values for every catalog-backed argument.
#[must_use]
pub fn render() -> String {
    let mut out = String::new();
    for kind in [
        OptionKind::Location,
        OptionKind::Skill,
        OptionKind::Availability,
    ] {
        let _ = writeln!(out, "{}:", kind.label());
        for value in kind.values() {
            let _ = writeln!(out, "  {value}");
        }
    }
    out
}
