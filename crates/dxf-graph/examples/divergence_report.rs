//! Batch divergence checker: compares block content across DXF files.

use dxf_graph::{analyze_paths, GraphBuilder};

fn main() {
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: divergence_report <file.dxf> [file.dxf ...]");
        std::process::exit(2);
    }

    println!("=== Per-document stats ===");
    for path in &paths {
        match GraphBuilder::new().build_from_file(path) {
            Ok(graph) => {
                println!(
                    "{}: {} nodes, {} edges",
                    path, graph.stats.node_count, graph.stats.edge_count
                );
                for (type_name, count) in &graph.stats.nodes_per_type {
                    println!("  {}: {}", type_name, count);
                }
            }
            Err(err) => {
                eprintln!("{}: {}", path, err);
                std::process::exit(1);
            }
        }
    }

    let report = analyze_paths(&paths).expect("already parsed above");

    println!("\n=== Block divergence ===");
    println!("Documents analyzed: {}", report.documents_analyzed);
    println!("Block names seen:   {}", report.total_block_names);
    println!("Consistent blocks:  {}", report.consistent_count);
    println!("Divergent blocks:   {}", report.divergent_count());

    for comparison in &report.divergent {
        println!("\nBlock {:?} has {} content variants:", comparison.name, comparison.groups.len());
        for group in &comparison.groups {
            println!("  {}", &group.content_hash[..16]);
            for occurrence in &group.occurrences {
                println!(
                    "    {} ({} references)",
                    occurrence.document, occurrence.reference_count
                );
            }
        }
    }

    if !report.is_consistent() {
        std::process::exit(1);
    }
}
