use std::fmt::Debug;

pub trait BaseGraph: Clone + Debug {
    fn degree(&self, u: usize) -> usize;
    fn order(&self) -> usize;
    fn is_clique(&self, vertices: &[usize]) -> bool;
    fn has_edge(&self, u: usize, v: usize) -> bool;
    fn vertices(&self) -> Box<dyn Iterator<Item = usize> + '_>;
    fn neighborhood(&self, u: usize) -> Box<dyn Iterator<Item = usize> + '_>;

    /// Number of missing edges among the neighbors of `u`.
    fn fill_in_count(&self, u: usize) -> usize {
        let nb: Vec<_> = self.neighborhood(u).collect();
        let mut count = 0;
        for (i, x) in nb.iter().enumerate() {
            for y in nb.iter().skip(i + 1) {
                if !self.has_edge(*x, *y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Number of neighbors of `u` that are not adjacent to all other neighbors of `u`.
    fn defect_count(&self, u: usize) -> usize {
        let nb: Vec<_> = self.neighborhood(u).collect();
        nb.iter()
            .filter(|x| nb.iter().any(|y| x != &y && !self.has_edge(**x, *y)))
            .count()
    }
}
