use pgclone_core::quote_literal;

/// Postgres truncates identifiers longer than this many bytes.
const MAX_IDENTIFIER_BYTES: usize = 63;

pub fn matview_definition(schema: &str, view: &str) -> String {
    format!(
        "SELECT definition FROM pg_matviews WHERE schemaname = {} AND matviewname = {};",
        quote_literal(schema),
        quote_literal(view)
    )
}

/// Name of the throwaway view used to read a materialized view's columns.
pub fn probe_view_name(view: &str) -> String {
    let mut name = format!("temp_analysis_{view}");
    if name.len() > MAX_IDENTIFIER_BYTES {
        let mut cut = MAX_IDENTIFIER_BYTES;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

pub fn create_probe_view(schema: &str, probe: &str, definition: &str) -> String {
    format!("CREATE OR REPLACE VIEW {schema}.{probe} AS {definition};")
}

pub fn drop_probe_view(schema: &str, probe: &str) -> String {
    format!("DROP VIEW IF EXISTS {schema}.{probe};")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_name_is_deterministic() {
        assert_eq!(probe_view_name("mv_stats"), "temp_analysis_mv_stats");
    }

    #[test]
    fn probe_name_fits_identifier_limit() {
        let long = "v".repeat(80);
        let probe = probe_view_name(&long);
        assert_eq!(probe.len(), 63);
        assert!(probe.starts_with("temp_analysis_vvv"));
    }

    #[test]
    fn definition_lookup_escapes_names() {
        assert_eq!(
            matview_definition("public", "a'b"),
            "SELECT definition FROM pg_matviews WHERE schemaname = 'public' AND matviewname = 'a''b';"
        );
    }
}
