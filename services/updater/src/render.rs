use energy_providers::providers::{MergePolicy, RunSummary};

pub(crate) fn render_summary(summary: &RunSummary, policy: MergePolicy) {
    println!("Energy providers update");
    println!("Collection: {}", summary.destination);
    println!("Merge policy: {}", policy.label());
    println!("Rows read: {}", summary.rows_read);
    println!("Providers built: {}", summary.providers_built);
    println!(
        "Merge: {} appended, {} updated, {} unchanged",
        summary.merge.appended, summary.merge.updated, summary.merge.skipped
    );
    println!("Providers in collection: {}", summary.total_providers);

    if summary.field_issues.is_empty() {
        println!("Missing fields: none");
    } else {
        println!("\nMissing fields (kept with sentinel values)");
        for issue in &summary.field_issues {
            println!("- line {}: {}", issue.line, issue.field);
        }
    }

    if !summary.persisted {
        println!("\nDry run: collection was not written");
    }
}
