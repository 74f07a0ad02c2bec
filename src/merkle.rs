use super::*;

/// Sibling hashes on the path from the coinbase (leftmost leaf) to the merkle root.
pub(crate) fn merkle_branches(non_coinbase_txids: Vec<Txid>) -> Vec<TxMerkleNode> {
    if non_coinbase_txids.is_empty() {
        return Vec::new();
    }

    let mut level: Vec<TxMerkleNode> = vec![TxMerkleNode::all_zeros()];

    level.extend(
        non_coinbase_txids
            .iter()
            .map(|id| TxMerkleNode::from_raw_hash(id.to_raw_hash())),
    );

    let mut branches = Vec::new();

    while level.len() > 1 {
        branches.push(level[1]);

        level = level
            .chunks(2)
            .map(|pair| hash_pair(pair[0], pair.get(1).copied().unwrap_or(pair[0])))
            .collect();
    }

    branches
}

pub(crate) fn merkle_root(coinbase_txid: Txid, merkle_branches: &[TxMerkleNode]) -> TxMerkleNode {
    merkle_branches.iter().fold(
        TxMerkleNode::from_raw_hash(coinbase_txid.to_raw_hash()),
        |root, branch| hash_pair(root, *branch),
    )
}

fn hash_pair(left: TxMerkleNode, right: TxMerkleNode) -> TxMerkleNode {
    let mut concat = Vec::with_capacity(64);
    concat.extend_from_slice(left.as_byte_array());
    concat.extend_from_slice(right.as_byte_array());
    TxMerkleNode::from_raw_hash(sha256d::Hash::hash(&concat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txid(n: u8) -> Txid {
        Txid::from_byte_array([n; 32])
    }

    #[test]
    fn no_transactions_means_no_branches() {
        assert!(merkle_branches(Vec::new()).is_empty());
        assert_eq!(
            merkle_root(txid(1), &[]),
            TxMerkleNode::from_byte_array([1; 32])
        );
    }

    #[test]
    fn matches_full_tree() {
        for count in 1..=7u8 {
            let txids: Vec<Txid> = (1..=count).map(txid).collect();
            let coinbase = txid(0xcb);

            let expected = bitcoin::merkle_tree::calculate_root(
                std::iter::once(coinbase)
                    .chain(txids.iter().copied())
                    .map(|id| TxMerkleNode::from_raw_hash(id.to_raw_hash())),
            )
            .unwrap();

            assert_eq!(
                merkle_root(coinbase, &merkle_branches(txids)),
                expected,
                "{count} non-coinbase transactions"
            );
        }
    }
}
