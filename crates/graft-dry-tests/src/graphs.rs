// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Small node/link schema and graph builders for copier tests.
//!
//! `NODE` carries `Name`, `Weight`, `Next` and `Links` in that slot order,
//! plus the inverses `Incoming` and `Outgoing` over `LINK.To` and
//! `LINK.From`.

use std::sync::Arc;

use graft_core::{
    AttributeType, EntityDef, EntityId, Model, ModelOptions, Schema, SchemaBuilder, TxId, TypeName,
    Value,
};

fn node_ref() -> AttributeType {
    AttributeType::Entity(TypeName::new("NODE"))
}

fn node_def() -> EntityDef {
    EntityDef::new("NODE")
        .supertype("ITEM")
        .optional("Weight", AttributeType::Real)
        .optional("Next", node_ref())
        .optional("Links", AttributeType::List(Box::new(node_ref())))
}

fn item_def() -> EntityDef {
    EntityDef::new("ITEM")
        .abstract_type()
        .attribute("Name", AttributeType::Text)
}

/// Node/link schema called `GRAPH`.
///
/// # Panics
/// Never in practice; the declaration is static.
#[allow(clippy::expect_used)]
pub fn graph_schema() -> Arc<Schema> {
    let schema = SchemaBuilder::new("GRAPH")
        .entity(item_def())
        .entity(
            node_def()
                .inverse("Incoming", "LINK", "To")
                .inverse("Outgoing", "LINK", "From"),
        )
        .entity(
            EntityDef::new("LINK")
                .supertype("ITEM")
                .attribute("From", node_ref())
                .attribute("To", node_ref()),
        )
        .build()
        .expect("graph schema should build");
    Arc::new(schema)
}

/// The graph schema without `LINK` (and so without inverses).
///
/// # Panics
/// Never in practice; the declaration is static.
#[allow(clippy::expect_used)]
pub fn node_only_schema() -> Arc<Schema> {
    let schema = SchemaBuilder::new("GRAPH")
        .entity(item_def())
        .entity(node_def())
        .build()
        .expect("node-only schema should build");
    Arc::new(schema)
}

/// Builds a populated source model inside one transaction.
///
/// Every mutation panics on failure; this is a fixture, not production code.
pub struct GraphBuilder {
    model: Model,
    tx: TxId,
    nodes: Vec<EntityId>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::expect_used)]
impl GraphBuilder {
    /// Starts an empty graph over [`graph_schema`].
    pub fn new() -> Self {
        Self::with_schema(graph_schema(), ModelOptions::default())
    }

    /// Starts an empty graph over `schema`.
    pub fn with_schema(schema: Arc<Schema>, options: ModelOptions) -> Self {
        let mut model = Model::with_options(schema, options);
        let tx = model.begin("build graph").expect("fresh model should open a tx");
        Self {
            model,
            tx,
            nodes: Vec::new(),
        }
    }

    /// Adds a node called `name`.
    pub fn node(&mut self, name: &str) -> EntityId {
        let id = self
            .model
            .create_entity(&TypeName::new("NODE"))
            .expect("create node");
        self.model
            .set_value(id, "Name", Value::Text(name.to_owned()))
            .expect("set node name");
        self.nodes.push(id);
        id
    }

    /// Adds `count` nodes called `n0`, `n1`, ...
    pub fn nodes(&mut self, count: usize) -> Vec<EntityId> {
        (0..count).map(|i| self.node(&format!("n{i}"))).collect()
    }

    /// Sets `from.Next = to`.
    pub fn next(&mut self, from: EntityId, to: EntityId) -> &mut Self {
        self.set(from, "Next", Value::Ref(to))
    }

    /// Sets `from.Links` to `targets` in order.
    pub fn links(&mut self, from: EntityId, targets: &[EntityId]) -> &mut Self {
        let list = targets.iter().copied().map(Value::Ref).collect();
        self.set(from, "Links", Value::List(list))
    }

    /// Sets `node.Weight`.
    pub fn weight(&mut self, node: EntityId, weight: f64) -> &mut Self {
        self.set(node, "Weight", Value::Real(weight))
    }

    /// Adds a `LINK` from `from` to `to`.
    pub fn link(&mut self, name: &str, from: EntityId, to: EntityId) -> EntityId {
        let id = self
            .model
            .create_entity(&TypeName::new("LINK"))
            .expect("create link");
        self.set(id, "Name", Value::Text(name.to_owned()));
        self.set(id, "From", Value::Ref(from));
        self.set(id, "To", Value::Ref(to));
        id
    }

    /// Sets one property by name.
    pub fn set(&mut self, entity: EntityId, property: &str, value: Value) -> &mut Self {
        self.model
            .set_value(entity, property, value)
            .expect("set property");
        self
    }

    /// Nodes added so far, in creation order.
    pub fn node_ids(&self) -> &[EntityId] {
        &self.nodes
    }

    /// Commits and returns the model.
    pub fn finish(mut self) -> Model {
        self.model.commit(self.tx).expect("commit graph");
        self.model
    }
}

/// `n` nodes where node `i` points at node `i + 1` through `Next`.
pub fn chain(n: usize) -> (Model, Vec<EntityId>) {
    let mut builder = GraphBuilder::new();
    let nodes = builder.nodes(n);
    for pair in nodes.windows(2) {
        builder.next(pair[0], pair[1]);
    }
    (builder.finish(), nodes)
}

/// [`chain`] closed into a ring: the last node points back at the first.
pub fn cycle(n: usize) -> (Model, Vec<EntityId>) {
    let mut builder = GraphBuilder::new();
    let nodes = builder.nodes(n);
    for (i, node) in nodes.iter().enumerate() {
        builder.next(*node, nodes[(i + 1) % n]);
    }
    (builder.finish(), nodes)
}

/// `n` nodes whose `Links` lists hold the targets of `edges` in edge order.
///
/// Edge endpoints are taken modulo `n`.
pub fn graph(n: usize, edges: &[(usize, usize)]) -> (Model, Vec<EntityId>) {
    let mut builder = GraphBuilder::new();
    let nodes = builder.nodes(n);
    for (i, node) in nodes.iter().enumerate() {
        let targets: Vec<EntityId> = edges
            .iter()
            .filter(|(from, _)| from % n == i)
            .map(|(_, to)| nodes[to % n])
            .collect();
        if !targets.is_empty() {
            builder.links(*node, &targets);
        }
    }
    (builder.finish(), nodes)
}

/// Empty model over `schema`.
pub fn empty_model(schema: Arc<Schema>) -> Model {
    Model::new(schema)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn chain_links_consecutive_nodes() {
        let (model, nodes) = chain(3);
        assert_eq!(model.value(nodes[0], "Next").unwrap(), Value::Ref(nodes[1]));
        assert_eq!(model.value(nodes[2], "Next").unwrap(), Value::Unset);
    }

    #[test]
    fn links_show_up_as_inverses() {
        let mut builder = GraphBuilder::new();
        let a = builder.node("a");
        let b = builder.node("b");
        let link = builder.link("ab", a, b);
        let model = builder.finish();
        assert_eq!(
            model.value(b, "Incoming").unwrap(),
            Value::List(vec![Value::Ref(link)])
        );
        assert_eq!(
            model.value(a, "Outgoing").unwrap(),
            Value::List(vec![Value::Ref(link)])
        );
    }
}
