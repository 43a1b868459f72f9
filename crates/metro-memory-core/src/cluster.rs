// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::catalog::{Station, StationId};
use std::collections::{BTreeMap, HashMap};

/// Cluster key (smallest member id) to sorted member ids.
pub type ClusterIndex = BTreeMap<StationId, Vec<StationId>>;

pub const ALIAS_SEPARATOR: &str = " / ";

/// Roughly 30 m at mid latitudes.
pub const DEFAULT_CLUSTER_DISTANCE: f64 = 0.0003;

/// Union-find over dense indices `0..n`.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    /// Root of `x`. Every node on the walked path is re-pointed at the root.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
        true
    }
}

/// Groups stations that stand for the same physical place.
#[derive(Debug, Clone, Copy)]
pub struct ClusterBuilder {
    distance: f64,
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_DISTANCE)
    }
}

impl ClusterBuilder {
    pub fn new(distance: f64) -> Self {
        Self { distance }
    }

    /// Assigns `cluster_key` on every clustered station, adds the cross-name
    /// aliases and returns the cluster index. Stations without point
    /// coordinates are left unclustered.
    pub fn build(&self, stations: &mut [Station]) -> ClusterIndex {
        // Arena slot -> position in `stations`
        let points: Vec<usize> = stations
            .iter()
            .enumerate()
            .filter(|(_, s)| s.coord().is_some())
            .map(|(i, _)| i)
            .collect();

        let mut sets = DisjointSet::new(points.len());

        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (slot, &pos) in points.iter().enumerate() {
            let name = stations[pos].name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            match by_name.get(&name) {
                Some(&first) => {
                    sets.union(first, slot);
                }
                None => {
                    by_name.insert(name, slot);
                }
            }
        }

        let coords: Vec<_> = points
            .iter()
            .filter_map(|&pos| stations[pos].coord())
            .collect();
        for i in 0..coords.len() {
            for j in (i + 1)..coords.len() {
                let dx = coords[i].lon - coords[j].lon;
                let dy = coords[i].lat - coords[j].lat;
                if (dx * dx + dy * dy).sqrt() < self.distance {
                    sets.union(i, j);
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for slot in 0..points.len() {
            let root = sets.find(slot);
            groups.entry(root).or_default().push(points[slot]);
        }

        let mut index = ClusterIndex::new();
        for members in groups.into_values().filter(|m| m.len() > 1) {
            let mut ids: Vec<StationId> = members.iter().map(|&p| stations[p].id).collect();
            ids.sort_unstable();
            let key = ids[0];

            for &pos in &members {
                stations[pos].cluster_key = Some(key);
            }
            add_sibling_aliases(stations, &members);
            index.insert(key, ids);
        }

        log::debug!(
            "[Cluster] {} point stations, {} clusters",
            points.len(),
            index.len()
        );
        index
    }
}

fn add_sibling_aliases(stations: &mut [Station], members: &[usize]) {
    // lowercase -> first spelling seen
    let mut distinct: BTreeMap<String, String> = BTreeMap::new();
    for &pos in members {
        let name = stations[pos].name.trim();
        if !name.is_empty() {
            distinct
                .entry(name.to_lowercase())
                .or_insert_with(|| name.to_string());
        }
    }
    if distinct.len() < 2 {
        return;
    }

    let all_names: Vec<&str> = distinct.values().map(String::as_str).collect();
    let global = all_names.join(ALIAS_SEPARATOR);

    for &pos in members {
        let own = stations[pos].name.trim().to_string();
        let own_lower = own.to_lowercase();
        let others: Vec<&str> = distinct
            .iter()
            .filter(|(lower, _)| **lower != own_lower)
            .map(|(_, name)| name.as_str())
            .collect();

        let mut aliases = vec![global.clone()];
        if !own.is_empty() {
            aliases.push(format!("{}{}{}", own, ALIAS_SEPARATOR, others.join(ALIAS_SEPARATOR)));
        }
        aliases.extend(others.iter().map(|n| n.to_string()));

        stations[pos].merge_alternates(aliases);
    }
}
