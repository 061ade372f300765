//! Built-in example scripts that can be installed into a fresh repository.

/// A named example script body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleScript {
    pub name: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

/// Clears the scene and adds a red cube at the origin.
const HELLO_CUBE: &str = r#"import bpy

# Clear existing objects
bpy.ops.object.select_all(action='SELECT')
bpy.ops.object.delete()

# Create a cube
bpy.ops.mesh.primitive_cube_add(size=2, location=(0, 0, 0))

# Create a material
mat = bpy.data.materials.new(name="Red Material")
mat.diffuse_color = (1, 0, 0, 1)

cube = bpy.context.active_object
if cube.data.materials:
    cube.data.materials[0] = mat
else:
    cube.data.materials.append(mat)

print("Created a red cube at the origin!")
"#;

/// Prints what a loaded blend file contains and nudges the first object.
const INSPECT_BLEND_FILE: &str = r#"import bpy

print(f"Current Blender version: {bpy.app.version_string}")
print(f"Current file: {bpy.data.filepath}")

print("\nObjects in the scene:")
for obj in bpy.data.objects:
    print(f" - {obj.name} ({obj.type})")

print("\nMaterials in the scene:")
for mat in bpy.data.materials:
    print(f" - {mat.name}")

print("\nScenes in the file:")
for scene in bpy.data.scenes:
    print(f" - {scene.name}")

if bpy.data.objects:
    obj = bpy.data.objects[0]
    original_z = obj.location.z
    obj.location.z += 1
    print(f"\nMoved {obj.name} up by 1 unit (from {original_z} to {obj.location.z})")
    # Uncomment to persist the change into the loaded file.
    # bpy.ops.wm.save_mainfile()
"#;

pub const BUILTIN_EXAMPLES: &[ExampleScript] = &[
    ExampleScript {
        name: "hello_cube",
        description: "Replace the scene with a single red cube",
        content: HELLO_CUBE,
    },
    ExampleScript {
        name: "inspect_blend_file",
        description: "List objects, materials and scenes of a loaded blend file",
        content: INSPECT_BLEND_FILE,
    },
];
