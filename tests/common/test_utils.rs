#![allow(dead_code)]

use std::rc::Rc;

use scene_ngin::{
    LightSource, Material, Mesh, PassState, RenderBackend, ShaderMatrices,
    cgmath::{Matrix4, Vector3},
};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn material(name: &str, alpha: f32) -> Rc<Material> {
    Rc::new(Material::new(name).with_alpha(alpha))
}

pub(crate) fn mesh(name: &str) -> Rc<Mesh> {
    Rc::new(Mesh::quad(name, 1.0))
}

pub(crate) fn mesh_with_material(name: &str, material: &Rc<Material>) -> Rc<Mesh> {
    Rc::new(Mesh::quad(name, 1.0).with_material(Rc::clone(material)))
}

pub(crate) fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(x, y, z))
}

/// Everything a backend was asked to do, in order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    PassState(PassState),
    SelectMaterial { material: String, model: Matrix4<f32> },
    Draw(String),
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub calls: Vec<Call>,
    pub lights: Vec<LightSource>,
}

impl RecordingBackend {
    pub fn drawn(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn set_pass_state(&mut self, state: &PassState) {
        self.calls.push(Call::PassState(*state));
    }

    fn select_material(&mut self, material: &Material, matrices: &ShaderMatrices, light: &LightSource) {
        self.calls.push(Call::SelectMaterial {
            material: material.name.clone(),
            model: matrices.model,
        });
        self.lights.push(light.clone());
    }

    fn draw_mesh(&mut self, mesh: &Rc<Mesh>) {
        self.calls.push(Call::Draw(mesh.name().to_string()));
    }
}
