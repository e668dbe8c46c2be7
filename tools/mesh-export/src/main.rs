//! mesh-export - scene to mesh container export tool
//!
//! Converts OBJ and glTF scenes to `.mesh` containers, plus a `.skeleton`
//! document for skinned scenes.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use mesh_export::inputs::collect_inputs;
use mesh_export::{convert, manifest, ConvertOptions, Winding};
use mesh_format::formats::table_rows;
use mesh_format::{MeshFile, SkeletonDocument};

#[derive(Parser)]
#[command(name = "mesh-export")]
#[command(about = "Scene to mesh container export tool")]
#[command(version)]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log every processed node and vertex
    #[arg(long, global = true, conflicts_with = "quiet")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert scene files or directories of scene files
    Convert {
        /// Input files (OBJ/glTF/GLB) or directories to search
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output .mesh file (single input only)
        #[arg(short, long, conflicts_with = "outdir")]
        output: Option<PathBuf>,

        /// Directory for outputs (default: next to each input)
        #[arg(long)]
        outdir: Option<PathBuf>,

        /// Omit vertex normals
        #[arg(long)]
        skip_normals: bool,

        /// Skip tangent generation
        #[arg(long)]
        skip_tangents: bool,

        /// Omit joint data and the skeleton document
        #[arg(long)]
        skip_joints: bool,

        /// Split quads counter-clockwise
        #[arg(long)]
        ccw: bool,
    },

    /// Build meshes from a manifest file
    Build {
        /// Path to meshes.toml manifest
        #[arg(default_value = "meshes.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to meshes.toml manifest
        #[arg(default_value = "meshes.toml")]
        manifest: PathBuf,
    },

    /// Decode a .mesh file and print its structure
    Inspect {
        /// Input .mesh file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        tracing::Level::WARN
    } else if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match cli.command {
        Commands::Convert {
            inputs,
            output,
            outdir,
            skip_normals,
            skip_tangents,
            skip_joints,
            ccw,
        } => {
            let options = ConvertOptions {
                skip_normals,
                skip_tangents,
                skip_joints,
                winding: if ccw { Winding::Ccw } else { Winding::Cw },
            };

            let inputs = collect_inputs(&inputs)?;
            if inputs.is_empty() {
                bail!("No supported input files found");
            }
            if output.is_some() && inputs.len() > 1 {
                bail!("--output requires a single input ({} found)", inputs.len());
            }

            let mut jobs = Vec::with_capacity(inputs.len());
            let mut targets = hashbrown::HashMap::new();
            for input in &inputs {
                let target = match (&output, &outdir) {
                    (Some(path), _) => path.clone(),
                    (None, Some(dir)) => output_in(dir, input)?,
                    (None, None) => convert::default_output(input),
                };
                if let Some(previous) = targets.insert(target.clone(), input) {
                    bail!(
                        "{:?} and {:?} would both be written to {:?}",
                        previous,
                        input,
                        target
                    );
                }
                jobs.push((input, target));
            }

            for (input, target) in jobs {
                tracing::info!("Converting {:?} -> {:?}", input, target);
                convert::convert_file(input, &target, &options)?;
            }
            tracing::info!("Done! ({} files)", inputs.len());
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building meshes from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Inspect { input } => inspect(&input)?,
    }

    Ok(())
}

fn output_in(dir: &Path, input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .with_context(|| format!("Input has no file name: {:?}", input))?;
    Ok(convert::default_output(&dir.join(stem)))
}

fn inspect(input: &Path) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
    let file = MeshFile::parse(&bytes).with_context(|| format!("Failed to decode {:?}", input))?;

    tracing::info!(
        "{:?}: version {:?}, scene block at {}, {} meshes, {} objects",
        input,
        file.header.version,
        file.header.scene_offset,
        file.meshes.len(),
        file.objects.len()
    );
    for mesh in &file.meshes {
        let owner = file
            .object_for_mesh(mesh.mesh_id)
            .map(|o| o.name.as_str())
            .unwrap_or("<unreferenced>");
        tracing::info!(
            "  mesh {} '{}': {} vertices, {} indices ({:?}), normals={} tangents={} skinned={}",
            mesh.mesh_id,
            owner,
            mesh.vertex_count(),
            mesh.indices.len(),
            mesh.index_format,
            mesh.normals.is_some(),
            mesh.tangents.is_some(),
            mesh.joint_weights.is_some()
        );
    }
    for object in &file.objects {
        tracing::info!(
            "  object {} '{}': parent={:?} mesh={:?}",
            object.object_id,
            object.name,
            object.parent_id,
            object.mesh_id
        );
    }

    let skeleton_path = convert::skeleton_output(input);
    if skeleton_path.exists() {
        let bytes = std::fs::read(&skeleton_path)?;
        let doc = SkeletonDocument::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {:?}", skeleton_path))?;
        tracing::info!("{:?}: {} joints", skeleton_path, doc.joints.len());
        for joint in &doc.joints {
            let rows = table_rows(&joint.bind_transform)
                .with_context(|| format!("Joint '{}' has an incomplete bind transform", joint.name))?;
            tracing::info!(
                "  joint {} '{}': parent={} bind translation=({}, {}, {})",
                joint.id,
                joint.name,
                joint.parent_id,
                rows[0][3],
                rows[1][3],
                rows[2][3]
            );
        }
    }

    Ok(())
}
