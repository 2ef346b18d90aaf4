//! Parsed game records.
//!
//! A [`Game`] owns every node of its variation tree in a single arena.
//! Parent and child links are [`NodeId`] indices into that arena, so the
//! arena is the only owner and parent links never form a second ownership
//! path. [`Node`] is a borrowed view for navigation.

/// Index into a game's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Insertion-ordered key/value list. Setting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn set(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Side that played a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn key(self) -> &'static str {
        match self {
            Self::Black => "B",
            Self::White => "W",
        }
    }
}

/// Node storage inside the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: Properties,
    move_no: Option<u32>,
}

impl GameNode {
    pub(crate) fn new(parent: Option<NodeId>, properties: Properties) -> Self {
        Self {
            parent,
            children: Vec::new(),
            properties,
            move_no: None,
        }
    }

    pub fn is_move(&self) -> bool {
        self.properties.contains("B") || self.properties.contains("W")
    }

    pub(crate) fn set_move_no(&mut self, move_no: u32) {
        self.move_no = Some(move_no);
    }
}

/// A parsed game record: game-scope properties plus the variation tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Game {
    properties: Properties,
    nodes: Vec<GameNode>,
    root: Option<NodeId>,
}

impl Game {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn root(&self) -> Option<Node<'_>> {
        self.root.map(|id| Node { game: self, id })
    }

    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.nodes.len()).then_some(Node { game: self, id })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in creation (input) order.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        (0..self.nodes.len()).map(|index| Node {
            game: self,
            id: NodeId::new(index),
        })
    }

    /// The root followed by the first child of each node, down to a leaf.
    pub fn main_line(&self) -> MainLine<'_> {
        MainLine { next: self.root() }
    }

    /// Number of move nodes on the main line.
    pub fn move_count(&self) -> usize {
        self.main_line().filter(|node| node.is_move()).count()
    }

    pub(crate) fn set_property(&mut self, key: &str, value: String) {
        self.properties.set(key, value);
    }

    /// Adds a node to the arena, linking it under `parent` or making it the
    /// root when `parent` is `None`.
    pub(crate) fn push_node(&mut self, node: GameNode) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let parent = node.parent;
        self.nodes.push(node);
        match parent {
            Some(parent) => self.nodes[parent.index()].children.push(id),
            None => self.root = Some(id),
        }
        id
    }

    fn data(&self, id: NodeId) -> &GameNode {
        &self.nodes[id.index()]
    }
}

/// Borrowed view of one node of a [`Game`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    game: &'a Game,
    id: NodeId,
}

impl<'a> Node<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.game.data(self.id).parent.map(|id| Node {
            game: self.game,
            id,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let game = self.game;
        game.data(self.id)
            .children
            .iter()
            .map(move |&id| Node { game, id })
    }

    pub fn child_count(&self) -> usize {
        self.game.data(self.id).children.len()
    }

    pub fn first_child(&self) -> Option<Node<'a>> {
        self.game.data(self.id).children.first().map(|&id| Node {
            game: self.game,
            id,
        })
    }

    pub fn properties(&self) -> &'a Properties {
        &self.game.data(self.id).properties
    }

    pub fn property(&self, key: &str) -> Option<&'a str> {
        self.properties().get(key)
    }

    pub fn move_no(&self) -> Option<u32> {
        self.game.data(self.id).move_no
    }

    pub fn is_move(&self) -> bool {
        self.game.data(self.id).is_move()
    }

    /// Side to which the move belongs. `B` wins if a node carries both.
    pub fn color(&self) -> Option<Color> {
        if self.properties().contains("B") {
            Some(Color::Black)
        } else if self.properties().contains("W") {
            Some(Color::White)
        } else {
            None
        }
    }

    /// Raw coordinate text of the move, uninterpreted.
    pub fn coordinate(&self) -> Option<&'a str> {
        self.color().and_then(|color| self.property(color.key()))
    }
}

pub struct MainLine<'a> {
    next: Option<Node<'a>>,
}

impl<'a> Iterator for MainLine<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.first_child();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        let mut properties = Properties::default();
        for (key, value) in pairs {
            properties.set(key, value.to_string());
        }
        properties
    }

    fn sample_game() -> Game {
        // root -> B[aa] -> { W[bb], W[cc] }
        let mut game = Game::default();
        let root = game.push_node(GameNode::new(None, props(&[("C", "start")])));
        let mut black = GameNode::new(Some(root), props(&[("B", "aa")]));
        black.set_move_no(1);
        let black = game.push_node(black);
        let mut first = GameNode::new(Some(black), props(&[("W", "bb")]));
        first.set_move_no(2);
        game.push_node(first);
        let mut second = GameNode::new(Some(black), props(&[("W", "cc")]));
        second.set_move_no(2);
        game.push_node(second);
        game
    }

    #[test]
    fn test_properties_keep_insertion_order_and_overwrite_in_place() {
        let properties = props(&[("PB", "Black"), ("PW", "White"), ("PB", "Other")]);

        let pairs: Vec<_> = properties.iter().collect();
        assert_eq!(pairs, vec![("PB", "Other"), ("PW", "White")]);
        assert_eq!(properties.len(), 2);
        assert_eq!(properties.get("PB"), Some("Other"));
        assert_eq!(properties.get("KM"), None);
    }

    #[test]
    fn test_push_node_links_parent_and_children() {
        let game = sample_game();
        let root = game.root().expect("root");

        assert!(root.parent().is_none());
        assert_eq!(root.child_count(), 1);

        let black = root.first_child().expect("black move");
        assert_eq!(black.parent().map(|n| n.id()), Some(root.id()));

        let replies: Vec<_> = black.children().filter_map(|n| n.coordinate()).collect();
        assert_eq!(replies, vec!["bb", "cc"]);
    }

    #[test]
    fn test_main_line_follows_first_children() {
        let game = sample_game();

        let coords: Vec<_> = game.main_line().map(|n| n.coordinate()).collect();
        assert_eq!(coords, vec![None, Some("aa"), Some("bb")]);
        assert_eq!(game.move_count(), 2);
        assert_eq!(game.node_count(), 4);
    }

    #[test]
    fn test_node_color_and_move_flag() {
        let game = sample_game();
        let nodes: Vec<_> = game.nodes().collect();

        assert!(!nodes[0].is_move());
        assert_eq!(nodes[0].color(), None);
        assert_eq!(nodes[1].color(), Some(Color::Black));
        assert_eq!(nodes[2].color(), Some(Color::White));
        assert_eq!(nodes[3].move_no(), Some(2));
    }

    #[test]
    fn test_node_lookup_out_of_range_is_none() {
        let game = sample_game();
        assert!(game.node(NodeId::new(3)).is_some());
        assert!(game.node(NodeId::new(4)).is_none());
    }

    #[test]
    fn test_empty_game_has_no_root() {
        let game = Game::default();
        assert!(game.root().is_none());
        assert_eq!(game.main_line().count(), 0);
        assert_eq!(game.move_count(), 0);
    }
}
