//! `supportdesk tools`: List the tool catalogue.

use supportdesk_tools::catalog;

pub fn run() {
    println!("{}", render());
}

fn render() -> String {
    let defs = catalog::definitions();
    let width = defs.iter().map(|d| d.name.len()).max().unwrap_or(0);

    let mut out = format!("🧰 {} tools available\n", defs.len());
    for def in &defs {
        let summary = def.description.lines().next().unwrap_or_default();
        out.push_str(&format!("\n  {:<width$}  {summary}", def.name));
    }
    out
}
