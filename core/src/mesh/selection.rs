use super::{EdgeId, ElemMask, ElemRef, FaceId, Mesh, MeshResult, VertId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Granularity the user is selecting at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectMode {
    #[default]
    Vertex,
    Edge,
    Face,
}

impl Mesh {
    pub fn vert_select_set(&mut self, v: VertId, select: bool) -> MeshResult<()> {
        self.vert_mut(v)?.select = select;
        if !select {
            // Nothing that uses a deselected vertex can stay selected.
            let edges = self.edges_of_vert(v)?.to_vec();
            for e in edges {
                self.edge_mut(e)?.select = false;
                let faces = self.faces_of_edge(e)?.to_vec();
                for f in faces {
                    self.face_mut(f)?.select = false;
                }
            }
        }
        Ok(())
    }

    pub fn edge_select_set(&mut self, e: EdgeId, select: bool) -> MeshResult<()> {
        let [a, b] = self.edge(e)?.verts;
        self.edge_mut(e)?.select = select;
        if select {
            self.vert_mut(a)?.select = true;
            self.vert_mut(b)?.select = true;
        } else {
            let faces = self.faces_of_edge(e)?.to_vec();
            for f in faces {
                self.face_mut(f)?.select = false;
            }
            for v in [a, b] {
                if !self.vert_has_selected_edge(v)? {
                    self.vert_mut(v)?.select = false;
                }
            }
        }
        Ok(())
    }

    pub fn face_select_set(&mut self, f: FaceId, select: bool) -> MeshResult<()> {
        let edges = self.face_edges(f)?;
        self.face_mut(f)?.select = select;
        if select {
            for e in edges {
                let [a, b] = self.edge(e)?.verts;
                self.edge_mut(e)?.select = true;
                self.vert_mut(a)?.select = true;
                self.vert_mut(b)?.select = true;
            }
        } else {
            for e in &edges {
                let in_other = self
                    .faces_of_edge(*e)?
                    .iter()
                    .any(|other| *other != f && self.face(*other).map(|x| x.select).unwrap_or(false));
                if !in_other {
                    self.edge_mut(*e)?.select = false;
                }
            }
            for e in edges {
                for v in self.edge(e)?.verts {
                    if !self.vert_has_selected_edge(v)? {
                        self.vert_mut(v)?.select = false;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn elem_select_set(&mut self, elem: ElemRef, select: bool) -> MeshResult<()> {
        match elem {
            ElemRef::Vert(v) => self.vert_select_set(v, select),
            ElemRef::Edge(e) => self.edge_select_set(e, select),
            ElemRef::Face(f) => self.face_select_set(f, select),
        }
    }

    fn vert_has_selected_edge(&self, v: VertId) -> MeshResult<bool> {
        Ok(self
            .edges_of_vert(v)?
            .iter()
            .any(|e| self.edge(*e).map(|e| e.select).unwrap_or(false)))
    }

    /// Clear selection on every element. The selection history goes with it.
    pub fn deselect_all(&mut self) {
        for v in self.verts.iter_mut().flatten() {
            v.select = false;
        }
        for e in self.edges.iter_mut().flatten() {
            e.select = false;
        }
        for f in self.faces.iter_mut().flatten() {
            f.select = false;
        }
        self.select_history.clear();
    }

    pub fn select_all(&mut self) {
        for v in self.verts.iter_mut().flatten() {
            v.select = true;
        }
        for e in self.edges.iter_mut().flatten() {
            e.select = true;
        }
        for f in self.faces.iter_mut().flatten() {
            f.select = true;
        }
    }

    /// Propagate selection upwards from the elements the mode selects.
    pub fn select_flush(&mut self, mode: SelectMode) {
        match mode {
            SelectMode::Vertex => {
                let edge_sel: Vec<(EdgeId, bool)> = self
                    .edges()
                    .map(|(id, e)| {
                        let sel = e.verts.iter().all(|v| self.vert(*v).map(|v| v.select).unwrap_or(false));
                        (id, sel)
                    })
                    .collect();
                for (id, sel) in edge_sel {
                    if let Ok(e) = self.edge_mut(id) {
                        e.select = sel;
                    }
                }
                let face_sel: Vec<(FaceId, bool)> = self
                    .faces()
                    .map(|(id, f)| {
                        let sel = f.verts.iter().all(|v| self.vert(*v).map(|v| v.select).unwrap_or(false));
                        (id, sel)
                    })
                    .collect();
                for (id, sel) in face_sel {
                    if let Ok(f) = self.face_mut(id) {
                        f.select = sel;
                    }
                }
            }
            SelectMode::Edge => {
                let face_sel: Vec<(FaceId, bool)> = self
                    .faces()
                    .map(|(id, _)| {
                        let sel = self
                            .face_edges(id)
                            .map(|edges| edges.iter().all(|e| self.edge(*e).map(|e| e.select).unwrap_or(false)))
                            .unwrap_or(false);
                        (id, sel)
                    })
                    .collect();
                for (id, sel) in face_sel {
                    if let Ok(f) = self.face_mut(id) {
                        f.select = sel;
                    }
                }
            }
            SelectMode::Face => {}
        }
    }

    pub fn selected_vert_count(&self) -> usize {
        self.verts().filter(|(_, v)| v.select).count()
    }

    pub fn selected_edge_count(&self) -> usize {
        self.edges().filter(|(_, e)| e.select).count()
    }

    pub fn selected_face_count(&self) -> usize {
        self.faces().filter(|(_, f)| f.select).count()
    }

    pub fn selected_verts(&self) -> Vec<VertId> {
        self.verts().filter(|(_, v)| v.select).map(|(id, _)| id).collect()
    }

    pub fn selected_count(&self, kind: ElemMask) -> usize {
        let mut n = 0;
        if kind.contains(ElemMask::VERT) {
            n += self.selected_vert_count();
        }
        if kind.contains(ElemMask::EDGE) {
            n += self.selected_edge_count();
        }
        if kind.contains(ElemMask::FACE) {
            n += self.selected_face_count();
        }
        n
    }

    /// Append to the selection history, moving an existing entry to the end.
    pub fn select_history_store(&mut self, elem: ElemRef) {
        self.select_history.retain(|h| *h != elem);
        self.select_history.push(elem);
    }

    /// Redirect history entries onto the elements they were copied to.
    pub fn select_history_remap(&mut self, map: &HashMap<ElemRef, ElemRef>) {
        for entry in self.select_history.iter_mut() {
            if let Some(target) = map.get(entry) {
                *entry = *target;
            }
        }
        let mut seen = std::collections::HashSet::new();
        self.select_history.retain(|h| seen.insert(*h));
    }
}
