use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

/// Row indices for one train/validation partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
}

fn shuffled(n: usize, seed: u64) -> Vec<usize> {
    let mut rows = (0..n).collect::<Vec<usize>>();
    rows.shuffle(&mut SmallRng::seed_from_u64(seed));
    rows
}

/// Single shuffled hold-out split; validation gets `ceil(n × share)` rows.
pub fn holdout(n: usize, share: f64, seed: u64) -> anyhow::Result<Fold> {
    anyhow::ensure!(
        share > 0.0 && share < 1.0,
        "validation share must lie strictly between 0 and 1, got {}",
        share
    );
    let n_valid = (n as f64 * share).ceil() as usize;
    anyhow::ensure!(
        n_valid >= 1 && n_valid < n,
        "cannot hold out {} of {} rows for validation",
        n_valid,
        n
    );
    let rows = shuffled(n, seed);
    let (valid, train) = rows.split_at(n_valid);
    Ok(Fold {
        train: train.to_vec(),
        valid: valid.to_vec(),
    })
}

/// Shuffled k-fold partition; the first `n % k` folds get one extra row.
pub fn kfold(n: usize, k: usize, seed: u64) -> anyhow::Result<Vec<Fold>> {
    anyhow::ensure!(k >= 2, "k-fold needs at least 2 folds, got {}", k);
    anyhow::ensure!(k <= n, "cannot split {} rows into {} folds", n, k);
    let rows = shuffled(n, seed);
    let mut start = 0;
    Ok((0..k)
        .map(|i| {
            let size = n / k + usize::from(i < n % k);
            let valid = rows[start..start + size].to_vec();
            let train = rows[..start]
                .iter()
                .chain(rows[start + size..].iter())
                .copied()
                .collect();
            start += size;
            Fold { train, valid }
        })
        .collect())
}
