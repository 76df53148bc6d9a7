use std::collections::HashMap;

use spade::{DelaunayTriangulation, Point2 as SpadePoint2, Triangulation};

use super::{Diagram, DiagramEdge, DiagramSource, DiagramVertex, Site};
use crate::error::{GeometryError, GraphError, Result};
use crate::math::{Point2, TOLERANCE};

/// Diagram source for point-only site sets, built as the dual of a
/// Delaunay triangulation.
///
/// Each finite Voronoi edge connects the circumcenters of two adjacent
/// triangles and separates the cells of the shared Delaunay edge's
/// endpoints. Edges with an unbounded endpoint (dual to hull edges) are
/// excluded, satisfying the finite-input contract of the graph builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelaunaySource;

impl DiagramSource for DelaunaySource {
    fn compute(&self, sites: &[Site]) -> Result<Diagram> {
        let mut triangulation: DelaunayTriangulation<SpadePoint2<f64>> =
            DelaunayTriangulation::new();
        let mut site_of_handle: HashMap<usize, usize> = HashMap::new();
        for (i, site) in sites.iter().enumerate() {
            let Site::Point(p) = site else {
                return Err(GraphError::SegmentSitesUnsupported.into());
            };
            let handle = triangulation
                .insert(SpadePoint2::new(p.x, p.y))
                .map_err(|e| GeometryError::Degenerate(format!("site {i}: {e:?}")))?;
            // Coincident sites collapse onto one triangulation vertex;
            // the first registered site keeps the cell.
            site_of_handle.entry(handle.index()).or_insert(i);
        }

        let mut diagram = Diagram::default();
        let mut vertex_of_face: HashMap<usize, usize> = HashMap::new();

        for edge in triangulation.undirected_edges() {
            let directed = edge.as_directed();
            let (Some(left), Some(right)) =
                (directed.face().as_inner(), directed.rev().face().as_inner())
            else {
                // Dual edge of a hull edge is an unbounded ray.
                continue;
            };

            let start = dual_vertex(&mut diagram, &mut vertex_of_face, left)?;
            let end = dual_vertex(&mut diagram, &mut vertex_of_face, right)?;
            let c0 = diagram.vertices[start].position;
            let c1 = diagram.vertices[end].position;
            if (c1 - c0).norm() < TOLERANCE {
                // Cocircular sites collapse the dual edge to a point.
                continue;
            }

            let site_a = site_of_handle[&directed.from().fix().index()];
            let site_b = site_of_handle[&directed.to().fix().index()];
            let pa = to_point(directed.from().position());
            // The half-edge stores the site whose cell lies on its right.
            let cross = (c1.x - c0.x) * (pa.y - c0.y) - (c1.y - c0.y) * (pa.x - c0.x);
            let (right_site, left_site) = if cross < 0.0 {
                (site_a, site_b)
            } else {
                (site_b, site_a)
            };

            let forward = diagram.edges.len();
            diagram.edges.push(DiagramEdge {
                start: Some(start),
                end: Some(end),
                twin: forward + 1,
                is_linear: true,
                site: right_site,
            });
            diagram.edges.push(DiagramEdge {
                start: Some(end),
                end: Some(start),
                twin: forward,
                is_linear: true,
                site: left_site,
            });
        }

        diagram.validate(sites.len())?;
        Ok(diagram)
    }
}

type InnerFace<'a> =
    spade::handles::FaceHandle<'a, spade::handles::InnerTag, SpadePoint2<f64>, (), (), ()>;

/// Returns the diagram vertex for a triangle's circumcenter, creating it
/// on first sight.
fn dual_vertex(
    diagram: &mut Diagram,
    vertex_of_face: &mut HashMap<usize, usize>,
    face: InnerFace<'_>,
) -> Result<usize> {
    if let Some(&v) = vertex_of_face.get(&face.fix().index()) {
        return Ok(v);
    }
    let [a, b, c] = face.vertices();
    let center = circumcenter(
        to_point(a.position()),
        to_point(b.position()),
        to_point(c.position()),
    )?;
    let index = diagram.vertices.len();
    diagram.vertices.push(DiagramVertex { position: center });
    vertex_of_face.insert(face.fix().index(), index);
    Ok(index)
}

fn to_point(p: SpadePoint2<f64>) -> Point2 {
    Point2::new(p.x, p.y)
}

fn circumcenter(a: Point2, b: Point2, c: Point2) -> Result<Point2> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < TOLERANCE {
        return Err(GeometryError::Degenerate(format!(
            "collinear triangle ({a:?}, {b:?}, {c:?})"
        ))
        .into());
    }
    let a2 = a.coords.norm_squared();
    let b2 = b.coords.norm_squared();
    let c2 = c.coords.norm_squared();
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    Ok(Point2::new(ux, uy))
}
