//! Table and JSON rendering for command results

use crate::cli::OutputFormat;
use crate::Result;
use fedadmin_common::{ClusterRef, Gate, Keyspace, Schema, Tablet};
use serde::Serialize;

/// Fixed-width text table, each column as wide as its widest cell
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        let header: Vec<String> = self.headers.iter().map(|h| h.to_string()).collect();
        for row in std::iter::once(&header).chain(&self.rows) {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        }

        out
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn clusters(format: OutputFormat, clusters: &[ClusterRef]) -> Result<String> {
    if format == OutputFormat::Json {
        return json(clusters);
    }

    let mut table = Table::new(&["ID", "NAME"]);
    for c in clusters {
        table.push(vec![c.id.clone(), c.name.clone()]);
    }
    Ok(table.render())
}

pub fn gates(format: OutputFormat, mut gates: Vec<Gate>) -> Result<String> {
    gates.sort_by(|a, b| (&a.cluster.id, &a.cell, &a.hostname).cmp(&(&b.cluster.id, &b.cell, &b.hostname)));
    if format == OutputFormat::Json {
        return json(&gates);
    }

    let mut table = Table::new(&["CLUSTER", "CELL", "HOSTNAME", "POOL", "KEYSPACES"]);
    for g in &gates {
        table.push(vec![
            g.cluster.id.clone(),
            g.cell.clone(),
            g.hostname.clone(),
            g.pool.clone(),
            g.keyspaces.join(","),
        ]);
    }
    Ok(table.render())
}

pub fn keyspaces(format: OutputFormat, mut keyspaces: Vec<Keyspace>) -> Result<String> {
    keyspaces.sort_by(|a, b| (&a.cluster.id, &a.keyspace.name).cmp(&(&b.cluster.id, &b.keyspace.name)));
    for ks in &mut keyspaces {
        ks.shards.sort_by(|a, b| a.name.cmp(&b.name));
    }
    if format == OutputFormat::Json {
        return json(&keyspaces);
    }

    let mut table = Table::new(&["CLUSTER", "KEYSPACE", "SHARDS"]);
    for ks in &keyspaces {
        let shards: Vec<&str> = ks.shards.iter().map(|s| s.name.as_str()).collect();
        table.push(vec![
            ks.cluster.id.clone(),
            ks.keyspace.name.clone(),
            shards.join(","),
        ]);
    }
    Ok(table.render())
}

pub fn schemas(format: OutputFormat, mut schemas: Vec<Schema>) -> Result<String> {
    schemas.sort_by(|a, b| (&a.cluster.id, &a.keyspace).cmp(&(&b.cluster.id, &b.keyspace)));
    if format == OutputFormat::Json {
        return json(&schemas);
    }

    let mut table = Table::new(&["CLUSTER", "KEYSPACE", "TABLE", "ROWS"]);
    for schema in &schemas {
        for td in &schema.table_definitions {
            table.push(vec![
                schema.cluster.id.clone(),
                schema.keyspace.clone(),
                td.name.clone(),
                td.row_count.to_string(),
            ]);
        }
    }
    Ok(table.render())
}

fn tablet_table(tablets: &[Tablet]) -> String {
    let mut table = Table::new(&[
        "CLUSTER", "ALIAS", "HOSTNAME", "KEYSPACE", "SHARD", "TYPE", "STATE",
    ]);
    for t in tablets {
        table.push(vec![
            t.cluster.id.clone(),
            t.alias.to_string(),
            t.hostname.clone(),
            t.keyspace.clone(),
            t.shard.clone(),
            t.tablet_type.to_string(),
            t.state.to_string(),
        ]);
    }
    table.render()
}

pub fn tablets(format: OutputFormat, mut tablets: Vec<Tablet>) -> Result<String> {
    tablets.sort_by(|a, b| (&a.cluster.id, &a.alias).cmp(&(&b.cluster.id, &b.alias)));
    if format == OutputFormat::Json {
        return json(&tablets);
    }
    Ok(tablet_table(&tablets))
}

pub fn tablet(format: OutputFormat, tablet: Tablet) -> Result<String> {
    if format == OutputFormat::Json {
        return json(&tablet);
    }
    Ok(tablet_table(std::slice::from_ref(&tablet)))
}

#[derive(Serialize)]
struct ExplainOutput<'a> {
    plan: &'a str,
}

pub fn explain(format: OutputFormat, plan: &str) -> Result<String> {
    if format == OutputFormat::Json {
        return json(&ExplainOutput { plan });
    }
    Ok(plan.to_string())
}
