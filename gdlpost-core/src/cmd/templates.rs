// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use crate::cfg::PostProcessingConfig;
use crate::classes::{ClassPlan, ClassTable};
use crate::cmd::command::ToolCommand;
use crate::constant;
use crate::ut::path::InferenceArtifacts;

/// Builds the external tool commands of the post-processing pipeline
#[derive(Debug, Clone, Copy)]
pub struct Templates<'a> {
    config: &'a PostProcessingConfig,
}

impl<'a> Templates<'a> {
    pub fn new(config: &'a PostProcessingConfig) -> Self {
        Templates { config }
    }

    fn qgis_model(&self, model: &str) -> ToolCommand {
        ToolCommand::new(&self.config.qgis_process).args(["run", model, "--"])
    }

    /// Polygonize an inference raster into a temporary geopackage
    pub fn vectorize(&self, source: &Path, output: &Path) -> ToolCommand {
        self.qgis_model(constant::MODEL_R2VECT)
            .path_param("inputraster", source)
            .param("cellsizeresamp", self.config.r2vect_cellsize_resamp)
            .path_param("grass7:r.to.vect_1:r2vect_output", output)
    }

    /// Simplify the vectorized classes with the template matching `plan`
    ///
    /// Single class plans use the first (and only) class of the table.
    pub fn simplify(
        &self,
        plan: ClassPlan,
        classes: &ClassTable,
        rtovect: &Path,
        artifacts: &InferenceArtifacts,
    ) -> ToolCommand {
        match plan {
            ClassPlan::RoadsOnly => {
                let (id, name) = classes.iter().next().unwrap_or((1, "roads"));
                let (raw, fin) = artifacts.class_outputs(name);
                self.single_class(constant::MODEL_SIMPLIFY_ROADS, rtovect, id, name)
                    .path_param("native:fixgeometries_4:raw_gpkg", raw)
                    .path_param("GeoSimplification:chordalaxis_1:final_gpkg", fin)
            }
            ClassPlan::BuildingsOnly => {
                let (id, name) = classes.iter().next().unwrap_or((1, "buildings"));
                let (raw, fin) = artifacts.class_outputs(name);
                let buildings = &self.config.buildings;
                self.single_class(constant::MODEL_SIMPLIFY_BUILDINGS, rtovect, id, name)
                    .param("orthomaxtol", buildings.orthogonalize_ang_thresh)
                    .param("recttol", buildings.recttol)
                    .param("compacttol", buildings.compacttol)
                    .param("patterntol", buildings.patterntol)
                    .path_param("native:fixgeometries_4:raw_gpkg", raw)
                    .path_param("native:orthogonalize_1:final_gpkg", fin)
            }
            ClassPlan::FourClass => {
                let buildings = &self.config.buildings;
                let mut command = self
                    .qgis_model(constant::MODEL_SIMPLIFY_4CLASSES)
                    .path_param("rtovectoutput", rtovect);

                for (n, (id, name)) in classes.iter().enumerate() {
                    let n = n + 1;
                    let (raw, fin) = artifacts.class_outputs(name);
                    command = command
                        .param(&format!("attrnum{}", n), id)
                        .param(&format!("classname{}", n), name)
                        .path_param(&format!("raw_gpkg{}", n), raw)
                        .path_param(&format!("final_gpkg{}", n), fin);
                }

                command
                    .param("removeholesunder", self.config.removeholesunder)
                    .param("simptol", self.config.simptol)
                    .param("reducebenddiamtol", self.config.redbenddiamtol)
                    .param("orthomaxtol", buildings.orthogonalize_ang_thresh)
                    .param("recttol", buildings.recttol)
                    .param("compacttol", buildings.compacttol)
                    .param("patterntol", buildings.patterntol)
            }
        }
    }

    fn single_class(&self, model: &str, rtovect: &Path, id: u32, name: &str) -> ToolCommand {
        self.qgis_model(model)
            .path_param("rtovectoutput", rtovect)
            .param("attrnum", id)
            .param("classname", name)
            .param("removeholesunder", self.config.removeholesunder)
            .param("simptol", self.config.simptol)
            .param("reducebenddiamtol", self.config.redbenddiamtol)
    }

    /// Package every per-class layer into the final geopackage
    pub fn package(&self, classes: &ClassTable, artifacts: &InferenceArtifacts) -> ToolCommand {
        let mut command = ToolCommand::new(&self.config.qgis_process).args([
            "run",
            constant::ALGORITHM_PACKAGE,
            "--",
        ]);

        for (_, name) in classes.iter() {
            let (raw, fin) = artifacts.class_outputs(name);
            command = command.path_param("LAYERS", raw).path_param("LAYERS", fin);
        }

        command
            .path_param("OUTPUT", &artifacts.final_gpkg)
            .param("OVERWRITE", "false")
    }

    /// Translate the source raster into a tiled, compressed COG
    pub fn cog(&self, artifacts: &InferenceArtifacts) -> ToolCommand {
        let mut command = ToolCommand::new(&self.config.gdal_translate)
            .arg(&artifacts.source)
            .arg(&artifacts.cog);

        for option in constant::COG_CREATION_OPTIONS {
            command = command.args(["-co", option]);
        }

        command
    }
}
