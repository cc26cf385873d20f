//! STL file parser for binary and ASCII formats

use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::opt,
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{MeshError, Result};
use crate::geometry::{Mesh, Point, PointIndex, Triangle};

/// Size of a binary STL header plus the triangle count
const BINARY_PREAMBLE: usize = 84;
/// Size of one binary triangle record
const BINARY_RECORD: usize = 50;

type Corners = [[f32; 3]; 3];

/// Collects triangle soup into an indexed mesh, merging corners whose
/// coordinates are bit-identical
struct MeshCollector {
    mesh: Mesh,
    seen: HashMap<[u32; 3], PointIndex>,
}

impl MeshCollector {
    fn with_capacity(triangles: usize) -> Self {
        let mut mesh = Mesh::new();
        mesh.faces.reserve(triangles);
        Self {
            mesh,
            seen: HashMap::new(),
        }
    }

    fn point(&mut self, xyz: [f32; 3]) -> PointIndex {
        // -0.0 and 0.0 name the same corner
        let xyz = xyz.map(|v| if v == 0.0 { 0.0 } else { v });
        let points = &mut self.mesh.points;
        *self.seen.entry(xyz.map(f32::to_bits)).or_insert_with(|| {
            points.push(Point::new(xyz[0], xyz[1], xyz[2]));
            points.len() - 1
        })
    }

    fn push(&mut self, corners: Corners) {
        let a = self.point(corners[0]);
        let b = self.point(corners[1]);
        let c = self.point(corners[2]);
        self.mesh.faces.push(Triangle::new(a, b, c));
    }

    fn finish(self) -> Mesh {
        self.mesh
    }
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh> {
    if data.len() < BINARY_PREAMBLE {
        return Err(MeshError::Parse("file too small to be a valid STL".to_string()));
    }

    let (records, triangle_count) = binary_preamble(data)
        .map_err(|e| MeshError::Parse(format!("bad binary header: {:?}", e)))?;
    let triangle_count = triangle_count as usize;

    let needed = triangle_count.saturating_mul(BINARY_RECORD);
    if records.len() < needed {
        return Err(MeshError::Parse(format!(
            "unexpected end of file: {} triangles need {} bytes, found {}",
            triangle_count,
            needed,
            records.len()
        )));
    }

    let (_, triangles) = count(binary_record, triangle_count)(records)
        .map_err(|e| MeshError::Parse(format!("bad triangle record: {:?}", e)))?;

    let mut collector = MeshCollector::with_capacity(triangle_count);
    for corners in triangles {
        collector.push(corners);
    }
    Ok(collector.finish())
}

fn binary_preamble(input: &[u8]) -> IResult<&[u8], u32> {
    // Skip 80-byte header
    let (input, _) = take(80usize)(input)?;
    le_u32(input)
}

fn binary_record(input: &[u8]) -> IResult<&[u8], Corners> {
    // Stored normal, recomputed from the corners when needed
    let (input, _) = binary_vector(input)?;
    let (input, a) = binary_vector(input)?;
    let (input, b) = binary_vector(input)?;
    let (input, c) = binary_vector(input)?;
    // Attribute byte count
    let (input, _) = le_u16(input)?;
    Ok((input, [a, b, c]))
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x, y, z]))
}

/// Parse an ASCII STL file.
///
/// Only the first solid is read; anything after its `endsolid` line is
/// ignored.
pub fn parse_ascii_stl(input: &str) -> Result<Mesh> {
    match parse_ascii_stl_impl(input) {
        Ok((rest, mesh)) => {
            if rest.contains("solid") {
                tracing::warn!("STL file holds more than one solid, only the first is loaded");
            }
            Ok(mesh)
        }
        Err(e) => Err(MeshError::Parse(format!("failed to parse ASCII STL: {:?}", e))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // Optional name
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(not_line_ending)(input)?;

    let mut collector = MeshCollector::with_capacity(triangles.len());
    for corners in triangles {
        collector.push(corners);
    }

    Ok((input, collector.finish()))
}

fn parse_facet(input: &str) -> IResult<&str, Corners> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, [v1, v2, v3]))
}

fn parse_vertex(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    parse_vector3(input)
}

fn parse_vector3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, [x, y, z]))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh> {
    // Try to detect format
    if data.len() > 5 && &data[0..5] == b"solid" {
        // Might be ASCII
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    // Try binary format
    parse_binary_stl(data)
}

/// Read an STL file from disk into an indexed mesh
pub fn load_stl<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;

    let mesh = parse_stl(&data).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    mesh.validate()?;

    tracing::info!(
        path = %path.display(),
        points = mesh.points.len(),
        faces = mesh.faces.len(),
        "loaded STL"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_FACETS: &str = "solid square
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 1 0 0
      vertex 1 1 0
      vertex 0 1 0
    endloop
  endfacet
endsolid square
";

    fn binary_stl(triangles: &[Corners]) -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for corners in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for corner in corners {
                for v in corner {
                    data.extend_from_slice(&v.to_le_bytes());
                }
            }
            data.extend_from_slice(&0u16.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let result = parse_binary_stl(&data);
        assert!(result.is_ok());
        let mesh = result.unwrap();
        assert_eq!(mesh.faces.len(), 0);
    }

    #[test]
    fn test_binary_merges_shared_corners() {
        let data = binary_stl(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.faces, vec![Triangle::new(0, 1, 2), Triangle::new(1, 3, 2)]);
    }

    #[test]
    fn test_binary_truncated() {
        let mut data = binary_stl(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        data.truncate(data.len() - 10);
        assert!(matches!(parse_binary_stl(&data), Err(MeshError::Parse(_))));
        assert!(parse_binary_stl(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_ascii_with_name() {
        let mesh = parse_stl(TWO_FACETS.as_bytes()).unwrap();
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.faces.len(), 2);
        assert_eq!(mesh.faces[1], Triangle::new(1, 3, 2));
        assert_eq!(mesh.points[3], Point::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_ascii_first_solid_only() {
        let text = format!("{}solid other\nendsolid other\n", TWO_FACETS)
            .replacen("endsolid square", "endsolid square\nsolid extra\n  facet normal 0 0 1\n    outer loop\n      vertex 5 5 5\n      vertex 6 5 5\n      vertex 5 6 5\n    endloop\n  endfacet\nendsolid extra", 1);
        let mesh = parse_ascii_stl(&text).unwrap();
        assert_eq!(mesh.faces.len(), 2);
        assert!(mesh.points.iter().all(|p| p.x < 5.0));
    }

    #[test]
    fn test_negative_zero_is_merged() {
        let data = binary_stl(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[-0.0, 0.0, 0.0], [0.0, -1.0, 0.0], [1.0, 0.0, 0.0]],
        ]);
        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.faces[1].points[0], 0);
    }

    #[test]
    fn test_load_stl_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_FACETS.as_bytes()).unwrap();

        let mesh = load_stl(file.path()).unwrap();
        assert_eq!(mesh.faces.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_stl(dir.path().join("missing.stl")), Err(MeshError::Io(_))));
    }

    #[test]
    fn test_load_garbage_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not an stl").unwrap();
        match load_stl(file.path()) {
            Err(MeshError::LoadError { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("unexpected result: {:?}", other.map(|m| m.faces.len())),
        }
    }
}
