/// Borrowed serialization layout of a collection.
///
/// Parent links are never written; they are rebuilt after deserialization.
#[derive(Serialize)]
struct CollectionWireRef<'a, C> {
    format_version: u32,
    name: &'a str,
    identity: Identity,
    is_child: bool,
    items: &'a [C],
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<&'a DeletedStore<C>>,
}

#[derive(Deserialize)]
struct CollectionWire<C> {
    format_version: u32,
    name: String,
    identity: Identity,
    is_child: bool,
    items: Vec<C>,
    deleted: Option<DeletedStore<C>>,
}

impl<C: EditableChild + Serialize> Serialize for EditableCollection<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        CollectionWireRef {
            format_version: COLLECTION_WIRE_FORMAT_VERSION,
            name: &self.name,
            identity: self.identity,
            is_child: self.is_child,
            items: &self.items,
            deleted: self.deleted.as_ref().filter(|store| !store.is_empty()),
        }
        .serialize(serializer)
    }
}

impl<'de, C: EditableChild + Deserialize<'de>> Deserialize<'de> for EditableCollection<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = CollectionWire::<C>::deserialize(deserializer)?;
        if wire.format_version > COLLECTION_WIRE_FORMAT_VERSION {
            return Err(de::Error::custom(format!(
                "unsupported collection format version {} (max {})",
                wire.format_version, COLLECTION_WIRE_FORMAT_VERSION
            )));
        }
        Ok(Self::from_wire(wire))
    }
}

impl<C: EditableChild> EditableCollection<C> {
    fn from_wire(wire: CollectionWire<C>) -> Self {
        let policy = CollectionPolicy::default();
        let node = GraphNode::new();
        let identity = node.next_identity(wire.identity);
        let mut collection = Self {
            name: wire.name,
            items: wire.items,
            deleted: wire.deleted,
            is_child: wire.is_child,
            identity,
            node,
            raise_change_events: false,
            runtime: CollectionRuntime::new(policy),
        };
        collection.reconnect_children();
        collection.raise_change_events = collection.runtime.policy.raise_change_events;
        debug!(
            "collection '{}' reconnected {} active and {} deleted children",
            collection.name,
            collection.items.len(),
            collection.deleted_count()
        );
        collection
    }
}

impl<C> EditableCollection<C>
where
    C: EditableChild + Serialize + DeserializeOwned,
{
    /// Deep copy of the whole graph through serialization.
    ///
    /// The copy shares no object with the original. It keeps the policy,
    /// the authorizer and the notification state, but no observers and no
    /// parent: the clone is a detached root of its own graph.
    pub fn clone_graph(&self) -> Result<Self> {
        let bytes = rmp_serde::to_vec_named(self)?;
        let mut clone: Self = rmp_serde::from_slice(&bytes)?;
        clone.runtime = self.runtime.detached();
        clone.raise_change_events = self.raise_change_events;
        Ok(clone)
    }

    /// Serializes the graph to JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuilds a graph from its JSON form, reconnecting every parent link.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
