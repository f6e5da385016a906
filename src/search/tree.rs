//! Search tree stored in an arena: nodes live in a single [`Vec`] and refer to
//! their children by index.

use rand::Rng;
use tracing::trace;

use crate::environment::{Action, Environment};
use crate::search::rollout::{playout, terminal_value};
use crate::search::SearchConfig;

type NodeId = usize;

struct Node<E> {
    state: E,
    /// Sum of the outcomes backpropagated through this node, from the
    /// perspective of the player to move in `state`.
    value: f64,
    visits: u32,
    /// Aligned with `state.legal_actions()`.
    children: Vec<NodeId>,
}

impl<E: Environment> Node<E> {
    fn new(state: E) -> Self {
        Self {
            state,
            value: 0.0,
            visits: 0,
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn add(&mut self, value: f64) {
        self.value += value;
        self.visits += 1;
    }

    /// Expected outcome for the player who made the move into this node.
    fn score(&self) -> Option<f64> {
        (self.visits > 0).then(|| 1.0 - self.value / f64::from(self.visits))
    }
}

/// Monte Carlo search tree rooted at a single state.
pub struct Tree<E: Environment> {
    nodes: Vec<Node<E>>,
    config: SearchConfig,
}

impl<E: Environment> Tree<E> {
    const ROOT: NodeId = 0;

    /// Creates a tree consisting of the root only.
    #[must_use]
    pub fn new(root: E, config: SearchConfig) -> Self {
        Self {
            nodes: vec![Node::new(root)],
            config,
        }
    }

    /// Total number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root is created with the tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The state the search started from.
    #[must_use]
    pub fn root(&self) -> &E {
        &self.nodes[Self::ROOT].state
    }

    /// Number of completed [`Tree::evaluate`] calls.
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.nodes[Self::ROOT].visits
    }

    /// Creates a child of the root for every legal action.
    pub fn expand_root(&mut self) {
        self.expand(Self::ROOT);
    }

    fn allocate(&mut self, node: Node<E>) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Replaces the children of the node with freshly created ones, one for
    /// each legal action.
    fn expand(&mut self, id: NodeId) {
        let actions = self.nodes[id].state.legal_actions();
        let mut children = Vec::with_capacity(actions.len());
        for &action in actions.iter() {
            let mut state = self.nodes[id].state.clone();
            state.advance(action);
            children.push(self.allocate(Node::new(state)));
        }
        trace!(node = id, children = children.len(), "expanded");
        self.nodes[id].children = children;
    }

    /// Picks the child to descend into. Children that have never been visited
    /// come first, in order. Once all of them have been visited, the one with
    /// the highest UCB1 score is chosen, the leftmost one on ties.
    fn select_child(&self, id: NodeId) -> NodeId {
        let children = &self.nodes[id].children;
        debug_assert!(!children.is_empty());
        if let Some(&unvisited) = children.iter().find(|&&child| self.nodes[child].visits == 0) {
            return unvisited;
        }

        let total: u32 = children.iter().map(|&child| self.nodes[child].visits).sum();
        let log_total = f64::from(total).ln();

        let mut best = children[0];
        let mut best_score = f64::NEG_INFINITY;
        for &child in children {
            let node = &self.nodes[child];
            let visits = f64::from(node.visits);
            let exploitation = 1.0 - node.value / visits;
            let score = self
                .config
                .exploration
                .mul_add((2.0 * log_total / visits).sqrt(), exploitation);
            if score > best_score {
                best = child;
                best_score = score;
            }
        }
        best
    }

    /// Runs one iteration of the search: selection, simulation, expansion and
    /// backpropagation. Returns the outcome from the root's perspective.
    pub fn evaluate(&mut self, rng: &mut impl Rng) -> f64 {
        let mut path = vec![Self::ROOT];
        let mut id = Self::ROOT;
        while !self.nodes[id].state.is_done() && !self.nodes[id].is_leaf() {
            id = self.select_child(id);
            path.push(id);
        }

        let leaf = &mut self.nodes[id];
        let mut value = match terminal_value(leaf.state.winning_status()) {
            Some(value) => {
                leaf.add(value);
                value
            },
            None => {
                let value = playout(leaf.state.clone(), rng);
                leaf.add(value);
                if leaf.visits >= self.config.expansion_threshold {
                    self.expand(id);
                }
                value
            },
        };

        // The leaf itself has been updated above.
        let _ = path.pop();
        for &ancestor in path.iter().rev() {
            value = 1.0 - value;
            self.nodes[ancestor].add(value);
        }
        value
    }

    /// Most visited action at the root, the leftmost one on ties. Returns
    /// `None` if there are no legal actions.
    ///
    /// # Panics
    ///
    /// Panics if the root children are out of sync with the legal actions.
    #[must_use]
    pub fn best_action(&self) -> Option<E::Action> {
        let root = &self.nodes[Self::ROOT];
        let actions = root.state.legal_actions();
        assert_eq!(
            actions.len(),
            root.children.len(),
            "root children do not match legal actions"
        );
        let mut best: Option<(E::Action, u32)> = None;
        for (&action, &child) in actions.iter().zip(&root.children) {
            let visits = self.nodes[child].visits;
            if best.map_or(true, |(_, most)| visits > most) {
                best = Some((action, visits));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Estimated probability of winning after playing each action, indexed by
    /// [`Action::index`]. Illegal and unvisited actions get `None`.
    ///
    /// # Panics
    ///
    /// Panics if the root children are out of sync with the legal actions.
    #[must_use]
    pub fn scores(&self) -> Vec<Option<f64>> {
        let root = &self.nodes[Self::ROOT];
        let actions = root.state.legal_actions();
        assert_eq!(
            actions.len(),
            root.children.len(),
            "root children do not match legal actions"
        );
        let mut scores = vec![None; E::ACTION_SPACE];
        for (&action, &child) in actions.iter().zip(&root.children) {
            scores[action.index()] = self.nodes[child].score();
        }
        scores
    }

    /// Visit counts of the root children, aligned with the legal actions.
    #[must_use]
    pub fn root_visits(&self) -> Vec<u32> {
        self.nodes[Self::ROOT]
            .children
            .iter()
            .map(|&child| self.nodes[child].visits)
            .collect()
    }
}
