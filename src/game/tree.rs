//! Explicit extensive-form game tree.
//!
//! The tree is an arena of nodes addressed by [`NodeId`]. Decision nodes point
//! at an information set owned by one player; chance nodes carry branch
//! probabilities; terminal nodes carry one payoff per player. Nodes may be
//! marked as subgame roots, which the decomposition driver uses to solve the
//! game piecewise.
//!
//! A tree is assembled with [`TreeBuilder`] (bottom-up) or expanded from any
//! [`Game`] with [`GameTree::from_game`]. Once built it is only read.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::traits::{Game, InfoState};

/// Index of a node in the tree arena.
pub type NodeId = usize;

/// Chance probabilities may deviate from summing to one by this much.
const CHANCE_TOLERANCE: f64 = 1e-9;

/// Errors raised while building or querying a game tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// Player index is not below the player count.
    #[error("player {player} out of range (game has {num_players} players)")]
    PlayerOutOfRange {
        /// Offending player index.
        player: usize,
        /// Number of players in the game.
        num_players: usize,
    },

    /// Infoset handle does not refer to a declared infoset.
    #[error("infoset {index} of player {player} does not exist")]
    UnknownInfoset {
        /// Owning player.
        player: usize,
        /// Infoset index within the player.
        index: usize,
    },

    /// Node id is not in the arena.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    /// Terminal payoff vector has the wrong length.
    #[error("terminal payoff vector has {actual} entries, expected {expected}")]
    PayoffLength {
        /// Number of players.
        expected: usize,
        /// Entries supplied.
        actual: usize,
    },

    /// Chance probabilities are negative or do not sum to one.
    #[error("chance probabilities must be non-negative and sum to 1 (sum = {0})")]
    InvalidChance(f64),

    /// Decision node child count differs from its infoset's action count.
    #[error("decision node at infoset '{label}' has {actual} children, infoset has {expected} actions")]
    ChildCount {
        /// Infoset label.
        label: String,
        /// Number of actions at the infoset.
        expected: usize,
        /// Number of children supplied.
        actual: usize,
    },

    /// Infoset declared without actions.
    #[error("infoset '{0}' has no actions")]
    NoActions(String),

    /// Node used as the child of two parents (or the root used as a child).
    #[error("node {0} has more than one parent")]
    SharedNode(NodeId),

    /// Node never reached from the root.
    #[error("node {0} is not reachable from the root")]
    Unreachable(NodeId),

    /// Infoset declared but never given a member node.
    #[error("infoset '{0}' has no member nodes")]
    EmptyInfoset(String),

    /// Same information state reached with different action counts.
    #[error("infoset '{key}' reached with {first} and then {second} actions")]
    InconsistentInfoset {
        /// Information state key.
        key: String,
        /// Action count seen first.
        first: usize,
        /// Action count seen later.
        second: usize,
    },

    /// Node cannot root a subgame: an infoset straddles its boundary.
    #[error("node {0} is not a valid subgame root")]
    InvalidSubgameRoot(NodeId),
}

/// Handle to an information set: owning player and index within that player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfosetId {
    /// Owning player (0-indexed).
    pub player: usize,
    /// Infoset index within the player (declaration order).
    pub index: usize,
}

/// What happens at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Game over: one payoff per player.
    Terminal {
        /// Payoff for each player.
        payoffs: Vec<f64>,
    },
    /// Nature moves: one probability per child.
    Chance {
        /// Branch probabilities, aligned with the children.
        probs: Vec<f64>,
    },
    /// A player moves: one child per action of the infoset.
    Decision {
        /// Infoset the node belongs to.
        infoset: InfosetId,
    },
}

/// A node of the arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    marked: bool,
}

impl Node {
    /// What happens at this node.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Child nodes, in action (or chance branch) order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent node, `None` at the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether the node is marked as a subgame root.
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Whether the node is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }
}

/// An information set: decision nodes its player cannot tell apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Infoset {
    player: usize,
    label: String,
    actions: Vec<String>,
    members: Vec<NodeId>,
}

impl Infoset {
    /// Owning player.
    pub fn player(&self) -> usize {
        self.player
    }

    /// Human-readable label (the information state key for expanded games).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Action labels in index order.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Number of actions.
    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// Member decision nodes, first one being the representative member.
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }
}

/// Bottom-up tree construction.
///
/// Children are created before their parents; [`TreeBuilder::build`] links
/// parents and validates the whole structure.
///
/// # Example
/// ```
/// use liap_solver::game::TreeBuilder;
///
/// let mut b = TreeBuilder::new(1);
/// let iset = b.add_infoset(0, "root", ["left", "right"]).unwrap();
/// let left = b.terminal(vec![1.0]).unwrap();
/// let right = b.terminal(vec![0.0]).unwrap();
/// let root = b.decision(iset, vec![left, right]).unwrap();
/// let tree = b.build(root).unwrap();
/// assert_eq!(tree.num_infosets(0), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    num_players: usize,
    nodes: Vec<Node>,
    infosets: Vec<Vec<Infoset>>,
}

impl TreeBuilder {
    /// Start an empty tree for `num_players` players.
    pub fn new(num_players: usize) -> Self {
        Self {
            num_players,
            nodes: Vec::new(),
            infosets: vec![Vec::new(); num_players],
        }
    }

    /// Declare an infoset for `player` with the given action labels.
    pub fn add_infoset<I, S>(
        &mut self,
        player: usize,
        label: impl Into<String>,
        actions: I,
    ) -> Result<InfosetId, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if player >= self.num_players {
            return Err(TreeError::PlayerOutOfRange {
                player,
                num_players: self.num_players,
            });
        }
        let label = label.into();
        let actions: Vec<String> = actions.into_iter().map(Into::into).collect();
        if actions.is_empty() {
            return Err(TreeError::NoActions(label));
        }

        let list = &mut self.infosets[player];
        list.push(Infoset {
            player,
            label,
            actions,
            members: Vec::new(),
        });
        Ok(InfosetId {
            player,
            index: list.len() - 1,
        })
    }

    /// Number of actions of a declared infoset.
    pub fn num_actions(&self, infoset: InfosetId) -> Result<usize, TreeError> {
        self.lookup(infoset).map(Infoset::num_actions)
    }

    /// Add a terminal node.
    pub fn terminal(&mut self, payoffs: Vec<f64>) -> Result<NodeId, TreeError> {
        if payoffs.len() != self.num_players {
            return Err(TreeError::PayoffLength {
                expected: self.num_players,
                actual: payoffs.len(),
            });
        }
        Ok(self.push(NodeKind::Terminal { payoffs }, Vec::new()))
    }

    /// Add a chance node from `(probability, child)` branches.
    pub fn chance(&mut self, branches: Vec<(f64, NodeId)>) -> Result<NodeId, TreeError> {
        let sum: f64 = branches.iter().map(|&(p, _)| p).sum();
        if branches.iter().any(|&(p, _)| p < 0.0 || !p.is_finite())
            || (sum - 1.0).abs() > CHANCE_TOLERANCE
        {
            return Err(TreeError::InvalidChance(sum));
        }
        for &(_, child) in &branches {
            self.check_node(child)?;
        }

        let (probs, children) = branches.into_iter().unzip();
        Ok(self.push(NodeKind::Chance { probs }, children))
    }

    /// Add a decision node at `infoset` with one child per action.
    pub fn decision(
        &mut self,
        infoset: InfosetId,
        children: Vec<NodeId>,
    ) -> Result<NodeId, TreeError> {
        let iset = self.lookup(infoset)?;
        if iset.num_actions() != children.len() {
            return Err(TreeError::ChildCount {
                label: iset.label.clone(),
                expected: iset.num_actions(),
                actual: children.len(),
            });
        }
        for &child in &children {
            self.check_node(child)?;
        }

        let id = self.push(NodeKind::Decision { infoset }, children);
        self.infosets[infoset.player][infoset.index].members.push(id);
        Ok(id)
    }

    /// Mark a node as a subgame root. Validity is checked by [`build`](Self::build).
    pub fn mark_subgame(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.check_node(node)?;
        self.nodes[node].marked = true;
        Ok(())
    }

    /// Link parents, validate, and produce the tree rooted at `root`.
    pub fn build(mut self, root: NodeId) -> Result<GameTree, TreeError> {
        self.check_node(root)?;

        for id in 0..self.nodes.len() {
            for k in 0..self.nodes[id].children.len() {
                let child = self.nodes[id].children[k];
                if child == root || self.nodes[child].parent.is_some() {
                    return Err(TreeError::SharedNode(child));
                }
                self.nodes[child].parent = Some(id);
            }
        }

        let mut reached = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            reached[id] = true;
            stack.extend_from_slice(&self.nodes[id].children);
        }
        if let Some(orphan) = reached.iter().position(|&r| !r) {
            return Err(TreeError::Unreachable(orphan));
        }

        for iset in self.infosets.iter().flatten() {
            if iset.members.is_empty() {
                return Err(TreeError::EmptyInfoset(iset.label.clone()));
            }
        }

        self.nodes[root].marked = true;
        let tree = GameTree {
            num_players: self.num_players,
            nodes: self.nodes,
            infosets: self.infosets,
            root,
        };

        for (id, node) in tree.nodes.iter().enumerate() {
            if node.marked && !tree.is_valid_subgame_root(id) {
                return Err(TreeError::InvalidSubgameRoot(id));
            }
        }

        Ok(tree)
    }

    fn push(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        self.nodes.push(Node {
            kind,
            children,
            parent: None,
            marked: false,
        });
        self.nodes.len() - 1
    }

    fn lookup(&self, infoset: InfosetId) -> Result<&Infoset, TreeError> {
        self.infosets
            .get(infoset.player)
            .and_then(|list| list.get(infoset.index))
            .ok_or(TreeError::UnknownInfoset {
                player: infoset.player,
                index: infoset.index,
            })
    }

    fn check_node(&self, node: NodeId) -> Result<(), TreeError> {
        if node < self.nodes.len() {
            Ok(())
        } else {
            Err(TreeError::UnknownNode(node))
        }
    }
}

/// A validated, read-only extensive-form game tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameTree {
    num_players: usize,
    nodes: Vec<Node>,
    infosets: Vec<Vec<Infoset>>,
    root: NodeId,
}

impl GameTree {
    /// Expand a state-transition [`Game`] into an explicit tree.
    ///
    /// Decision nodes are grouped into infosets by `(player, info_state().key())`;
    /// infosets are numbered per player in preorder discovery order.
    pub fn from_game<G: Game>(game: &G) -> Result<Self, TreeError> {
        let mut builder = TreeBuilder::new(game.num_players());
        let mut lookup: FxHashMap<(usize, String), InfosetId> = FxHashMap::default();
        let root = expand(game, &game.initial_state(), &mut builder, &mut lookup)?;
        builder.build(root)
    }

    /// Number of players.
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Number of infosets owned by `player`.
    pub fn num_infosets(&self, player: usize) -> usize {
        self.infosets[player].len()
    }

    /// All infosets of `player` in declaration order.
    pub fn infosets(&self, player: usize) -> &[Infoset] {
        &self.infosets[player]
    }

    /// One infoset.
    pub fn infoset(&self, player: usize, index: usize) -> &Infoset {
        &self.infosets[player][index]
    }

    /// Find an infoset of `player` by label.
    pub fn find_infoset(&self, player: usize, label: &str) -> Option<usize> {
        self.infosets[player].iter().position(|i| i.label == label)
    }

    /// Root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// One node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Parent of a node, `None` at the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Nearest marked ancestor-or-self of `node`.
    pub fn subgame_root(&self, node: NodeId) -> NodeId {
        let mut current = node;
        loop {
            if self.nodes[current].marked {
                return current;
            }
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// All marked subgame roots, children before parents; the tree root is last.
    pub fn marked_subgame_roots(&self) -> Vec<NodeId> {
        let mut roots = Vec::new();
        // (node, children already pushed)
        let mut stack = vec![(self.root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                if self.nodes[id].marked {
                    roots.push(id);
                }
                continue;
            }
            stack.push((id, true));
            for &child in self.nodes[id].children.iter().rev() {
                stack.push((child, false));
            }
        }
        roots
    }

    /// Whether every infoset with a member below `node` has all members below it.
    pub fn is_valid_subgame_root(&self, node: NodeId) -> bool {
        let inside = self.subtree_mask(node);
        inside.iter().enumerate().filter(|&(_, &i)| i).all(|(id, _)| {
            match self.nodes[id].kind {
                NodeKind::Decision { infoset } => self.infosets[infoset.player][infoset.index]
                    .members
                    .iter()
                    .all(|&m| inside[m]),
                _ => true,
            }
        })
    }

    /// Mark `node` as a subgame root.
    pub fn mark_subgame(&mut self, node: NodeId) -> Result<(), TreeError> {
        if node >= self.nodes.len() {
            return Err(TreeError::UnknownNode(node));
        }
        if !self.is_valid_subgame_root(node) {
            return Err(TreeError::InvalidSubgameRoot(node));
        }
        self.nodes[node].marked = true;
        Ok(())
    }

    /// Mark every non-terminal node that can root a subgame.
    pub fn mark_all_subgames(&mut self) {
        for id in 0..self.nodes.len() {
            if !self.nodes[id].is_terminal() && self.is_valid_subgame_root(id) {
                self.nodes[id].marked = true;
            }
        }
    }

    /// Copy the subgame rooted at `root` into a standalone tree.
    ///
    /// Nodes listed in `solved` (other than `root` itself) become terminals
    /// carrying the given payoffs. Infosets of the copy keep this tree's
    /// per-player declaration order, and nested marks are preserved.
    pub fn subgame(
        &self,
        root: NodeId,
        solved: &FxHashMap<NodeId, Vec<f64>>,
    ) -> Result<GameTree, TreeError> {
        if root >= self.nodes.len() {
            return Err(TreeError::UnknownNode(root));
        }
        if !self.is_valid_subgame_root(root) {
            return Err(TreeError::InvalidSubgameRoot(root));
        }

        let collapsed = |id: NodeId| id != root && solved.contains_key(&id);

        let mut used = vec![Vec::new(); self.num_players];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if collapsed(id) {
                continue;
            }
            if let NodeKind::Decision { infoset } = self.nodes[id].kind {
                used[infoset.player].push(infoset.index);
            }
            stack.extend_from_slice(&self.nodes[id].children);
        }

        let mut builder = TreeBuilder::new(self.num_players);
        let mut renumber: FxHashMap<InfosetId, InfosetId> = FxHashMap::default();
        for (player, indices) in used.iter_mut().enumerate() {
            indices.sort_unstable();
            indices.dedup();
            for &index in indices.iter() {
                let iset = &self.infosets[player][index];
                let new_id = builder.add_infoset(player, iset.label.clone(), iset.actions.clone())?;
                renumber.insert(InfosetId { player, index }, new_id);
            }
        }

        let new_root = self.copy_into(root, root, solved, &renumber, &mut builder)?;
        builder.build(new_root)
    }

    fn copy_into(
        &self,
        id: NodeId,
        root: NodeId,
        solved: &FxHashMap<NodeId, Vec<f64>>,
        renumber: &FxHashMap<InfosetId, InfosetId>,
        builder: &mut TreeBuilder,
    ) -> Result<NodeId, TreeError> {
        if id != root {
            if let Some(payoffs) = solved.get(&id) {
                return builder.terminal(payoffs.clone());
            }
        }

        let node = &self.nodes[id];
        let mut children = Vec::with_capacity(node.children.len());
        for &child in &node.children {
            children.push(self.copy_into(child, root, solved, renumber, builder)?);
        }

        let copy = match &node.kind {
            NodeKind::Terminal { payoffs } => builder.terminal(payoffs.clone())?,
            NodeKind::Chance { probs } => {
                builder.chance(probs.iter().copied().zip(children).collect())?
            }
            NodeKind::Decision { infoset } => {
                let mapped = renumber.get(infoset).copied().ok_or(TreeError::UnknownInfoset {
                    player: infoset.player,
                    index: infoset.index,
                })?;
                builder.decision(mapped, children)?
            }
        };
        if id != root && node.marked {
            builder.mark_subgame(copy)?;
        }
        Ok(copy)
    }

    fn subtree_mask(&self, node: NodeId) -> Vec<bool> {
        let mut inside = vec![false; self.nodes.len()];
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            inside[id] = true;
            stack.extend_from_slice(&self.nodes[id].children);
        }
        inside
    }
}

fn expand<G: Game>(
    game: &G,
    state: &G::State,
    builder: &mut TreeBuilder,
    lookup: &mut FxHashMap<(usize, String), InfosetId>,
) -> Result<NodeId, TreeError> {
    let payoffs = |state: &G::State| -> Vec<f64> {
        (0..game.num_players())
            .map(|player| game.get_payoff(state, player))
            .collect()
    };

    if game.is_terminal(state) {
        return builder.terminal(payoffs(state));
    }

    if game.is_chance(state) {
        let mut branches = Vec::new();
        for (next, prob) in game.chance_outcomes(state) {
            branches.push((prob, expand(game, &next, builder, lookup)?));
        }
        return builder.chance(branches);
    }

    let player = match game.current_player(state) {
        Some(p) => p,
        None => return builder.terminal(payoffs(state)),
    };
    let actions = game.available_actions(state);
    if actions.is_empty() {
        return builder.terminal(payoffs(state));
    }

    let key = game.info_state(state).key();
    let infoset = match lookup.get(&(player, key.clone())) {
        Some(&id) => {
            let first = builder.num_actions(id)?;
            if first != actions.len() {
                return Err(TreeError::InconsistentInfoset {
                    key,
                    first,
                    second: actions.len(),
                });
            }
            id
        }
        None => {
            let names: Vec<String> = actions.iter().map(|a| game.action_name(a)).collect();
            let id = builder.add_infoset(player, key.clone(), names)?;
            lookup.insert((player, key), id);
            id
        }
    };

    let mut children = Vec::with_capacity(actions.len());
    for action in &actions {
        let next = game.apply_action(state, action);
        children.push(expand(game, &next, builder, lookup)?);
    }
    builder.decision(infoset, children)
}
