//! MCTS Tree structure and node management
//!
//! Uses arena allocation for efficient tree operations. Node states are
//! materialized lazily: a child only receives its `GameState` the first time
//! selection reaches it.
//!
//! ## Architecture
//! - Level 2: Tree operations (select, materialize, expand, backpropagate)
//! - Level 3: UCB1 calculation, node accessors
//! - Level 4: Statistics, utilities

use rand::Rng;
use yinsh_core::{GameState, IllegalMove, Move, Player};

// ============================================================================
// TYPES
// ============================================================================

/// Node identifier (index into arena)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// Statistics for a tree node
#[derive(Clone, Debug)]
pub struct NodeStats {
    /// Visit count; starts at 1 so the UCB terms are always defined
    pub visits: u32,
    /// Simulations won by this node's color
    pub wins: u32,
    /// Virtual loss counter (for batched MCTS)
    pub virtual_losses: u32,
}

impl Default for NodeStats {
    fn default() -> Self {
        Self {
            visits: 1,
            wins: 0,
            virtual_losses: 0,
        }
    }
}

impl NodeStats {
    pub fn win_rate(&self) -> f64 {
        self.wins as f64 / self.visits as f64
    }

    /// Adjusted visits including virtual losses
    pub fn adjusted_visits(&self) -> u32 {
        self.visits + self.virtual_losses
    }
}

/// A node in the MCTS tree
#[derive(Clone, Debug)]
pub struct MctsNode {
    /// Player credited with wins here: the one who made `incoming_move`
    pub color: Player,
    /// Game state at this node, once materialized
    pub state: Option<GameState>,
    /// Parent node (None for root)
    pub parent: Option<NodeId>,
    /// Move that led to this node (None for root)
    pub incoming_move: Option<Move>,
    /// Children: (move, node_id) pairs in move-generation order
    pub children: Vec<(Move, NodeId)>,
    pub stats: NodeStats,
    pub expanded: bool,
}

impl MctsNode {
    fn root(state: GameState) -> Self {
        Self {
            color: state.next_player().opponent(),
            state: Some(state),
            parent: None,
            incoming_move: None,
            children: Vec::new(),
            stats: NodeStats::default(),
            expanded: false,
        }
    }

    fn child(color: Player, parent: NodeId, mv: Move) -> Self {
        Self {
            color,
            state: None,
            parent: Some(parent),
            incoming_move: Some(mv),
            children: Vec::new(),
            stats: NodeStats::default(),
            expanded: false,
        }
    }

    /// Is this a terminal node? Unmaterialized nodes are not known to be.
    pub fn is_terminal(&self) -> bool {
        self.state.as_ref().is_some_and(GameState::is_over)
    }
}

// ============================================================================
// MCTS TREE (Level 2 - Tree Operations)
// ============================================================================

/// MCTS search tree with arena allocation
#[derive(Debug)]
pub struct MctsTree {
    nodes: Vec<MctsNode>,
}

impl MctsTree {
    /// Create a new tree with the given root state
    pub fn new(root_state: GameState) -> Self {
        Self {
            nodes: vec![MctsNode::root(root_state)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Level 2: Tree Operations
    // ========================================================================

    /// Descend by UCB1 from the root until an unexpanded node is reached
    pub fn select_leaf(&self, exploration: f64) -> NodeId {
        let mut current = self.root();
        while self.get(current).expanded {
            match self.select_best_child(current, exploration) {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }

    /// Give `id` its state: the parent's state, the incoming move, and a
    /// random resolution of any rows it creates.
    pub fn materialize<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> Result<(), IllegalMove> {
        let node = self.get(id);
        if node.state.is_some() {
            return Ok(());
        }
        let (Some(parent), Some(mv)) = (node.parent, node.incoming_move) else {
            return Ok(());
        };

        self.materialize(parent, rng)?;
        let Some(mut state) = self.get(parent).state.clone() else {
            return Ok(());
        };
        state.make_move(mv)?;
        state.resolve_rows_randomly(rng);
        self.get_mut(id).state = Some(state);
        Ok(())
    }

    /// Add one child per legal move of a materialized, non-terminal node.
    ///
    /// Returns the number of children. Terminal or unmaterialized nodes stay
    /// unexpanded.
    pub fn expand(&mut self, id: NodeId) -> usize {
        let node = self.get(id);
        if node.expanded {
            return node.children.len();
        }
        if node.is_terminal() {
            return 0;
        }
        let Some(state) = node.state.as_ref() else {
            return 0;
        };

        let color = state.next_player();
        let moves: Vec<Move> = state.legal_moves().collect();
        let mut children = Vec::with_capacity(moves.len());
        for mv in moves {
            let child_id = NodeId(self.nodes.len());
            self.nodes.push(MctsNode::child(color, id, mv));
            children.push((mv, child_id));
        }

        let node = self.get_mut(id);
        node.children = children;
        node.expanded = true;
        node.children.len()
    }

    // ========================================================================
    // Level 3: Selection Helpers
    // ========================================================================

    /// Child with the highest UCB1; the first one wins ties
    fn select_best_child(&self, node_id: NodeId, exploration: f64) -> Option<NodeId> {
        let node = self.get(node_id);
        let parent_visits = node.stats.adjusted_visits();

        let mut best: Option<(NodeId, f64)> = None;
        for &(_, child) in &node.children {
            let score = self.ucb1(child, parent_visits, exploration);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((child, score));
            }
        }
        best.map(|(id, _)| id)
    }

    /// UCB1 = wins/visits + C * sqrt(ln(parent_visits) / visits)
    ///
    /// Virtual losses count as visits without wins.
    pub fn ucb1(&self, node_id: NodeId, parent_visits: u32, exploration: f64) -> f64 {
        let stats = &self.get(node_id).stats;
        let visits = stats.adjusted_visits() as f64;

        let exploitation = stats.wins as f64 / visits;
        let exploration_term = exploration * ((parent_visits as f64).ln() / visits).sqrt();

        exploitation + exploration_term
    }

    // ========================================================================
    // Level 2: Backpropagation
    // ========================================================================

    /// Walk from `leaf` up to, but not including, the root.
    ///
    /// Every node on the way gains a visit; nodes whose color is `winner`
    /// gain a win.
    pub fn backpropagate(&mut self, leaf_id: NodeId, winner: Option<Player>) {
        let mut current = leaf_id;
        while let Some(parent) = self.get(current).parent {
            let node = self.get_mut(current);
            node.stats.visits += 1;
            if winner == Some(node.color) {
                node.stats.wins += 1;
            }
            current = parent;
        }
    }

    /// Count one completed iteration at the root, so ln(parent visits) grows
    pub fn record_root_visit(&mut self) {
        self.get_mut(NodeId::ROOT).stats.visits += 1;
    }

    /// Add virtual loss for batched MCTS (prevents selecting same node)
    pub fn add_virtual_loss(&mut self, node_id: NodeId) {
        let mut current = Some(node_id);
        while let Some(id) = current {
            self.get_mut(id).stats.virtual_losses += 1;
            current = self.get(id).parent;
        }
    }

    pub fn remove_virtual_loss(&mut self, node_id: NodeId) {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.stats.virtual_losses = node.stats.virtual_losses.saturating_sub(1);
            current = node.parent;
        }
    }

    // ========================================================================
    // Level 3: Best Move Selection
    // ========================================================================

    /// Most visited root move, ties broken by higher win rate
    pub fn best_move(&self) -> Option<Move> {
        let root = self.get(self.root());

        let mut best: Option<(Move, &NodeStats)> = None;
        for &(mv, id) in &root.children {
            let stats = &self.get(id).stats;
            let better = match best {
                None => true,
                Some((_, b)) => {
                    stats.visits > b.visits
                        || (stats.visits == b.visits && stats.win_rate() > b.win_rate())
                }
            };
            if better {
                best = Some((mv, stats));
            }
        }
        best.map(|(mv, _)| mv)
    }

    /// Root moves with (visits, wins, win rate)
    pub fn move_statistics(&self) -> Vec<(Move, u32, u32, f64)> {
        self.get(self.root())
            .children
            .iter()
            .map(|&(mv, id)| {
                let stats = &self.get(id).stats;
                (mv, stats.visits, stats.wins, stats.win_rate())
            })
            .collect()
    }

    /// Completed iterations (root visits beyond the initial one)
    pub fn total_simulations(&self) -> u32 {
        self.get(self.root()).stats.visits - 1
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use yinsh_core::{Hex, Variant};

    fn opening() -> GameState {
        GameState::new_game(Variant::Standard)
    }

    #[test]
    fn test_tree_creation() {
        let tree = MctsTree::new(opening());

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), NodeId::ROOT);
        let root = tree.get(NodeId::ROOT);
        assert!(root.parent.is_none());
        assert!(root.incoming_move.is_none());
        assert_eq!(root.color, Player::Black);
        assert_eq!(root.stats.visits, 1);
        assert_eq!(root.stats.wins, 0);
    }

    #[test]
    fn test_terminal_node_stays_unexpanded() {
        let board = yinsh_core::Board::from_cells([
            (Hex::ORIGIN, yinsh_core::Cell::Ring(Player::White)),
            (Hex::new(1, 0), yinsh_core::Cell::Ring(Player::Black)),
        ])
        .unwrap();
        let won = GameState::from_parts(board, 1, 0, Player::Black, false, Variant::Blitz);
        let mut tree = MctsTree::new(won);

        assert!(tree.get(NodeId::ROOT).is_terminal());
        assert_eq!(tree.expand(NodeId::ROOT), 0);
        assert!(!tree.get(NodeId::ROOT).expanded);
        assert_eq!(tree.len(), 1);

        // Unmaterialized children are not known to be terminal
        let mut tree = MctsTree::new(opening());
        tree.expand(NodeId::ROOT);
        let (_, child) = tree.get(NodeId::ROOT).children[0];
        assert!(!tree.get(child).is_terminal());
    }

    #[test]
    fn test_tree_expansion() {
        let mut tree = MctsTree::new(opening());

        assert_eq!(tree.expand(NodeId::ROOT), 85);
        assert_eq!(tree.len(), 86);
        assert!(tree.get(NodeId::ROOT).expanded);

        let (mv, child) = tree.get(NodeId::ROOT).children[0];
        assert_eq!(mv, Move::place(Hex::ORIGIN));
        assert_eq!(tree.get(child).parent, Some(NodeId::ROOT));
        assert_eq!(tree.get(child).color, Player::White);
        assert!(tree.get(child).state.is_none());

        // Expanding twice adds nothing
        assert_eq!(tree.expand(NodeId::ROOT), 85);
        assert_eq!(tree.len(), 86);
    }

    #[test]
    fn test_materialize_applies_incoming_move() {
        let mut tree = MctsTree::new(opening());
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        tree.expand(NodeId::ROOT);

        let (mv, child) = tree.get(NodeId::ROOT).children[3];
        tree.materialize(child, &mut rng).unwrap();

        let state = tree.get(child).state.as_ref().unwrap();
        assert_eq!(state.next_player(), Player::Black);
        assert!(state.board().ring_at(mv.src()).is_some());
        // The root state is untouched
        assert_eq!(tree.get(NodeId::ROOT).state, Some(opening()));
    }

    #[test]
    fn test_select_leaf_prefers_unvisited() {
        let mut tree = MctsTree::new(opening());
        tree.expand(NodeId::ROOT);
        tree.record_root_visit();

        let first = tree.get(NodeId::ROOT).children[0].1;
        tree.get_mut(first).stats.visits = 5;
        let leaf = tree.select_leaf(1.41);
        assert_ne!(leaf, first);
        assert_eq!(tree.get(leaf).parent, Some(NodeId::ROOT));
    }

    #[test]
    fn test_virtual_loss() {
        let mut tree = MctsTree::new(opening());
        tree.expand(NodeId::ROOT);
        let child = tree.get(NodeId::ROOT).children[0].1;

        tree.add_virtual_loss(child);
        assert_eq!(tree.get(child).stats.virtual_losses, 1);
        assert_eq!(tree.get(NodeId::ROOT).stats.virtual_losses, 1);
        assert_eq!(tree.get(child).stats.adjusted_visits(), 2);

        tree.remove_virtual_loss(child);
        assert_eq!(tree.get(child).stats.virtual_losses, 0);
        assert_eq!(tree.get(NodeId::ROOT).stats.virtual_losses, 0);
    }

    #[test]
    fn test_backpropagation_skips_root() {
        let mut tree = MctsTree::new(opening());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        tree.expand(NodeId::ROOT);
        let child = tree.get(NodeId::ROOT).children[0].1;
        tree.materialize(child, &mut rng).unwrap();
        tree.expand(child);
        let grandchild = tree.get(child).children[0].1;

        tree.backpropagate(grandchild, Some(Player::Black));

        assert_eq!(tree.get(NodeId::ROOT).stats.visits, 1);
        assert_eq!(tree.get(child).stats.visits, 2);
        assert_eq!(tree.get(child).stats.wins, 0);
        assert_eq!(tree.get(grandchild).stats.visits, 2);
        assert_eq!(tree.get(grandchild).stats.wins, 1);

        tree.backpropagate(grandchild, None);
        assert_eq!(tree.get(grandchild).stats.visits, 3);
        assert_eq!(tree.get(grandchild).stats.wins, 1);
    }

    #[test]
    fn test_best_move_tie_breaks_on_win_rate() {
        let mut tree = MctsTree::new(opening());
        tree.expand(NodeId::ROOT);
        let children = tree.get(NodeId::ROOT).children.clone();

        tree.get_mut(children[1].1).stats.visits = 10;
        tree.get_mut(children[2].1).stats.visits = 10;
        tree.get_mut(children[2].1).stats.wins = 4;
        assert_eq!(tree.best_move(), Some(children[2].0));

        tree.get_mut(children[5].1).stats.visits = 11;
        assert_eq!(tree.best_move(), Some(children[5].0));
    }

    #[test]
    fn test_ucb1_with_virtual_loss() {
        let mut tree = MctsTree::new(opening());
        tree.expand(NodeId::ROOT);
        let child = tree.get(NodeId::ROOT).children[0].1;
        tree.get_mut(child).stats.visits = 4;
        tree.get_mut(child).stats.wins = 2;

        let plain = tree.ucb1(child, 10, 1.0);
        assert!((plain - (0.5 + (10f64.ln() / 4.0).sqrt())).abs() < 1e-12);

        tree.get_mut(child).stats.virtual_losses = 4;
        assert!(tree.ucb1(child, 10, 1.0) < plain);
    }
}
