//! Saves and loads policies and action-value tables as YAML lists of entries.

use std::fs;
use std::path::Path;

use blackjack_rl::{Action, ActionValues, BaseState, Policy, QTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Cannot encode or decode table: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct PolicyEntry {
    state: BaseState,
    action: Action,
}

#[derive(Debug, Serialize, Deserialize)]
struct QEntry {
    state: BaseState,
    values: ActionValues,
}

fn write_file(path: &Path, content: &str) -> Result<(), PersistenceError> {
    fs::write(path, content).map_err(|source| PersistenceError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn read_file(path: &Path) -> Result<String, PersistenceError> {
    fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub fn policy_to_yaml(policy: &Policy) -> Result<String, PersistenceError> {
    let mut entries: Vec<PolicyEntry> = policy
        .iter()
        .map(|(state, action)| PolicyEntry {
            state: *state,
            action: *action,
        })
        .collect();
    entries.sort_by_key(|entry| entry.state);
    Ok(serde_yaml::to_string(&entries)?)
}

pub fn policy_from_yaml(content: &str) -> Result<Policy, PersistenceError> {
    let entries: Vec<PolicyEntry> = serde_yaml::from_str(content)?;
    Ok(entries
        .into_iter()
        .map(|entry| (entry.state, entry.action))
        .collect())
}

pub fn q_table_to_yaml(q: &QTable) -> Result<String, PersistenceError> {
    let mut entries: Vec<QEntry> = q
        .iter()
        .map(|(state, values)| QEntry {
            state: *state,
            values: *values,
        })
        .collect();
    entries.sort_by_key(|entry| entry.state);
    Ok(serde_yaml::to_string(&entries)?)
}

pub fn q_table_from_yaml(content: &str) -> Result<QTable, PersistenceError> {
    let entries: Vec<QEntry> = serde_yaml::from_str(content)?;
    Ok(entries
        .into_iter()
        .map(|entry| (entry.state, entry.values))
        .collect())
}

pub fn save_policy(policy: &Policy, path: &Path) -> Result<(), PersistenceError> {
    write_file(path, &policy_to_yaml(policy)?)
}

pub fn load_policy(path: &Path) -> Result<Policy, PersistenceError> {
    policy_from_yaml(&read_file(path)?)
}

pub fn save_q_table(q: &QTable, path: &Path) -> Result<(), PersistenceError> {
    write_file(path, &q_table_to_yaml(q)?)
}

pub fn load_q_table(path: &Path) -> Result<QTable, PersistenceError> {
    q_table_from_yaml(&read_file(path)?)
}
