//! Small hand-built trees: one-shot decisions and simultaneous-move games.

use crate::game::{GameTree, TreeBuilder, TreeError};

/// One player choosing once among actions with the given payoffs.
pub fn decision(payoffs: &[f64]) -> Result<GameTree, TreeError> {
    let mut b = TreeBuilder::new(1);
    let iset = b.add_infoset(0, "decision", (0..payoffs.len()).map(|a| format!("a{}", a)))?;
    let mut children = Vec::with_capacity(payoffs.len());
    for &u in payoffs {
        children.push(b.terminal(vec![u])?);
    }
    let root = b.decision(iset, children)?;
    b.build(root)
}

/// Two-player simultaneous-move game.
///
/// Player 1 picks a row, then player 2 picks a column without seeing the row
/// (all of player 2's nodes share one infoset). `p1[r][c]` and `p2[r][c]` are
/// the payoffs.
///
/// # Panics
/// Panics if the two payoff matrices have different row counts.
pub fn bimatrix<const C: usize>(p1: &[[f64; C]], p2: &[[f64; C]]) -> Result<GameTree, TreeError> {
    assert_eq!(p1.len(), p2.len(), "payoff matrices differ in shape");

    let mut b = TreeBuilder::new(2);
    let rows = b.add_infoset(0, "rows", (0..p1.len()).map(|r| format!("r{}", r)))?;
    let cols = b.add_infoset(1, "cols", (0..C).map(|c| format!("c{}", c)))?;

    let mut row_nodes = Vec::with_capacity(p1.len());
    for (r1, r2) in p1.iter().zip(p2) {
        let mut leaves = Vec::with_capacity(C);
        for c in 0..C {
            leaves.push(b.terminal(vec![r1[c], r2[c]])?);
        }
        row_nodes.push(b.decision(cols, leaves)?);
    }
    let root = b.decision(rows, row_nodes)?;
    b.build(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::NodeKind;

    #[test]
    fn test_bimatrix_shape() {
        let tree = bimatrix(&[[3.0, 0.0], [5.0, 1.0]], &[[3.0, 5.0], [0.0, 1.0]]).unwrap();
        assert_eq!(tree.num_infosets(0), 1);
        assert_eq!(tree.num_infosets(1), 1);
        assert_eq!(tree.infoset(1, 0).members().len(), 2);
        assert_eq!(tree.num_nodes(), 7);

        let second_row = tree.node(tree.root()).children()[1];
        let leaf = tree.node(second_row).children()[0];
        assert_eq!(
            tree.node(leaf).kind(),
            &NodeKind::Terminal {
                payoffs: vec![5.0, 0.0]
            }
        );
    }

    #[test]
    fn test_decision_shape() {
        let tree = decision(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(tree.infoset(0, 0).num_actions(), 3);
        assert_eq!(tree.infoset(0, 0).actions()[2], "a2");
    }
}
