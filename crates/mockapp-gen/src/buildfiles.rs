//! Build declarations for each supported build system.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Build system the generated project targets.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildFlavor {
    #[default]
    Buck,
    Bazel,
    #[value(name = "cocoapods")]
    CocoaPods,
}

impl BuildFlavor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buck => "buck",
            Self::Bazel => "bazel",
            Self::CocoaPods => "cocoapods",
        }
    }

    /// File name of a library's build declaration.
    #[must_use]
    pub fn library_build_file(self, module: &str) -> String {
        match self {
            Self::Buck => "BUCK".to_string(),
            Self::Bazel => "BUILD".to_string(),
            Self::CocoaPods => format!("{module}.podspec"),
        }
    }

    /// What to run next in the generated directory.
    #[must_use]
    pub const fn example_command(self) -> &'static str {
        match self {
            Self::Buck => "buck project //App:App",
            Self::Bazel => "Use Tulsi or XCHammer to generate an Xcode project.",
            Self::CocoaPods => "pod install",
        }
    }
}

/// Podfile switches for the CocoaPods flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodfileOptions {
    pub dynamic_linking: bool,
    pub deterministic_uuids: bool,
    pub multiple_pod_projects: bool,
}

impl Default for PodfileOptions {
    fn default() -> Self {
        Self {
            dynamic_linking: false,
            deterministic_uuids: true,
            multiple_pod_projects: false,
        }
    }
}

/// Renders build files for one flavor.
#[derive(Debug, Clone)]
pub struct BuildFileWriter {
    flavor: BuildFlavor,
    use_wmo: bool,
    module_path: String,
    podfile: PodfileOptions,
}

impl BuildFileWriter {
    /// `module_path` is the directory (relative to the build root) holding
    /// the module directories; empty means the root itself.
    #[must_use]
    pub fn new(
        flavor: BuildFlavor,
        use_wmo: bool,
        module_path: &str,
        podfile: PodfileOptions,
    ) -> Self {
        Self {
            flavor,
            use_wmo,
            module_path: module_path.trim_matches('/').to_string(),
            podfile,
        }
    }

    const fn wmo_state(&self) -> &'static str {
        if self.use_wmo { "YES" } else { "NO" }
    }

    /// Fully qualified target label of `module`.
    #[must_use]
    pub fn label(&self, module: &str) -> String {
        if self.module_path.is_empty() {
            format!("//{module}:{module}")
        } else {
            format!("//{}/{module}:{module}", self.module_path)
        }
    }

    fn dep_list(&self, deps: &[&str], quote: char) -> String {
        deps.iter()
            .map(|dep| format!("        {quote}{}{quote},\n", self.label(dep)))
            .collect()
    }

    fn pod_deps(deps: &[&str], indent: &str, receiver: &str) -> String {
        deps.iter()
            .map(|dep| format!("{indent}{receiver}.dependency '{dep}'\n"))
            .collect()
    }

    /// Build declaration for a library module.
    #[must_use]
    pub fn library(&self, name: &str, language: Language, deps: &[&str]) -> String {
        match self.flavor {
            BuildFlavor::Buck => self.buck_library(name, deps),
            BuildFlavor::Bazel => self.bazel_library(name, language, deps),
            BuildFlavor::CocoaPods => self.podspec_library(name, deps),
        }
    }

    /// Build declaration for the app module.
    #[must_use]
    pub fn app(&self, deps: &[&str], all_libraries: &[&str]) -> String {
        match self.flavor {
            BuildFlavor::Buck => self.buck_app(deps, all_libraries),
            BuildFlavor::Bazel => self.bazel_app(deps),
            BuildFlavor::CocoaPods => self.podspec_app(deps),
        }
    }

    fn buck_library(&self, name: &str, deps: &[&str]) -> String {
        let deps = self.dep_list(deps, '\'');
        let wmo = self.wmo_state();
        format!(
            r"apple_library(
    name = '{name}',
    srcs = glob(['Sources/*.swift', 'Sources/*.m']),
    exported_headers = glob(['Sources/*.h']),
    modular = True,
    swift_version = '5',
    configs = {{
        'Debug': {{
            'SWIFT_WHOLE_MODULE_OPTIMIZATION': '{wmo}',
        }},
    }},
    visibility = ['PUBLIC'],
    deps = [
{deps}    ],
)

apple_test(
    name = '{name}Tests',
    srcs = glob(['Tests/*.swift']),
    info_plist = '//App:Info.plist',
    deps = [':{name}'],
)

xcode_workspace_config(
    name = '{name}Scheme',
    src_target = ':{name}',
)
"
        )
    }

    fn buck_app(&self, deps: &[&str], all_libraries: &[&str]) -> String {
        let deps = self.dep_list(deps, '\'');
        let wmo = self.wmo_state();
        let schemes: String = all_libraries
            .iter()
            .map(|lib| {
                let quoted = format!("'{lib}'");
                format!("        {quoted:<20}: '{}Scheme',\n", self.label(lib))
            })
            .collect();
        format!(
            r"export_file(
    name = 'Info.plist',
    visibility = ['PUBLIC'],
)

apple_binary(
    name = 'AppBinary',
    srcs = ['AppDelegate.swift'],
    swift_version = '5',
    configs = {{
        'Debug': {{
            'SWIFT_WHOLE_MODULE_OPTIMIZATION': '{wmo}',
        }},
    }},
    deps = [
{deps}    ],
)

apple_bundle(
    name = 'App',
    binary = ':AppBinary',
    extension = 'app',
    info_plist = 'Info.plist',
)

xcode_workspace_config(
    name = 'AppWorkspace',
    src_target = ':App',
    extra_schemes = {{
{schemes}    }},
)
"
        )
    }

    fn swift_copts(&self) -> &'static str {
        if self.use_wmo {
            "[\"-whole-module-optimization\"]"
        } else {
            "[]"
        }
    }

    fn bazel_library(&self, name: &str, language: Language, deps: &[&str]) -> String {
        let deps = self.dep_list(deps, '"');
        match language {
            Language::Swift => {
                let copts = self.swift_copts();
                format!(
                    r#"load("@build_bazel_rules_swift//swift:swift.bzl", "swift_library")

swift_library(
    name = "{name}",
    srcs = glob(["Sources/*.swift"]),
    module_name = "{name}",
    copts = {copts},
    visibility = ["//visibility:public"],
    deps = [
{deps}    ],
)
"#
                )
            }
            Language::ObjC => format!(
                r#"objc_library(
    name = "{name}",
    srcs = glob(["Sources/*.m"]),
    hdrs = glob(["Sources/*.h"]),
    module_name = "{name}",
    enable_modules = True,
    visibility = ["//visibility:public"],
    deps = [
{deps}    ],
)
"#
            ),
        }
    }

    fn bazel_app(&self, deps: &[&str]) -> String {
        let deps = self.dep_list(deps, '"');
        let copts = self.swift_copts();
        format!(
            r#"load("@build_bazel_rules_apple//apple:ios.bzl", "ios_application")
load("@build_bazel_rules_swift//swift:swift.bzl", "swift_library")

swift_library(
    name = "AppSources",
    srcs = ["AppDelegate.swift"],
    copts = {copts},
    deps = [
{deps}    ],
)

ios_application(
    name = "App",
    bundle_id = "com.mockapp.App",
    families = ["iphone"],
    infoplists = ["Info.plist"],
    minimum_os_version = "12.0",
    deps = [":AppSources"],
)
"#
        )
    }

    fn podspec_library(&self, name: &str, deps: &[&str]) -> String {
        let deps = Self::pod_deps(deps, "  ", "s");
        let wmo = self.wmo_state();
        format!(
            r"Pod::Spec.new do |s|
  s.name = '{name}'
  s.version = '1.0.0'
  s.summary = 'Generated mock module {name}.'
  s.homepage = 'https://example.com/mockapp'
  s.license = {{ :type => 'MIT' }}
  s.author = {{ 'mockapp' => 'mockapp@example.com' }}
  s.source = {{ :git => 'https://example.com/mockapp.git', :tag => s.version.to_s }}
  s.ios.deployment_target = '12.0'
  s.swift_version = '5.0'
  s.source_files = 'Sources/*.{{swift,h,m}}'
  s.pod_target_xcconfig = {{ 'SWIFT_WHOLE_MODULE_OPTIMIZATION' => '{wmo}' }}
{deps}
  s.test_spec 'Tests' do |test_spec|
    test_spec.source_files = 'Tests/*.swift'
  end
end
"
        )
    }

    fn podspec_app(&self, deps: &[&str]) -> String {
        let deps = Self::pod_deps(deps, "    ", "app_spec");
        let wmo = self.wmo_state();
        format!(
            r"Pod::Spec.new do |s|
  s.name = 'AppContainer'
  s.version = '1.0.0'
  s.summary = 'Container for the generated mock app.'
  s.homepage = 'https://example.com/mockapp'
  s.license = {{ :type => 'MIT' }}
  s.author = {{ 'mockapp' => 'mockapp@example.com' }}
  s.source = {{ :git => 'https://example.com/mockapp.git', :tag => s.version.to_s }}
  s.ios.deployment_target = '12.0'
  s.swift_version = '5.0'
  s.source_files = 'dummy.swift'

  s.app_spec 'App' do |app_spec|
    app_spec.source_files = 'AppDelegate.swift'
    app_spec.pod_target_xcconfig = {{
      'INFOPLIST_FILE' => '${{PODS_TARGET_SRCROOT}}/Info.plist',
      'SWIFT_WHOLE_MODULE_OPTIMIZATION' => '{wmo}',
    }}
{deps}  end
end
"
        )
    }

    /// Podfile pulling in the app container and every library.
    #[must_use]
    pub fn podfile(&self, all_libraries: &[&str]) -> String {
        let pods: String = all_libraries
            .iter()
            .map(|lib| format!("  pod '{lib}', :path => '{lib}/{lib}.podspec'\n"))
            .collect();
        let linkage = if self.podfile.dynamic_linking {
            ":dynamic"
        } else {
            ":static"
        };
        let uuids = self.podfile.deterministic_uuids;
        let multiple = self.podfile.multiple_pod_projects;
        format!(
            r"platform :ios, '12.0'
use_frameworks! :linkage => {linkage}
install! 'cocoapods',
  :integrate_targets => false,
  :deterministic_uuids => {uuids},
  :generate_multiple_pod_projects => {multiple}

abstract_target 'MockApp' do
  pod 'AppContainer', :path => 'App/AppContainer.podspec', :appspecs => ['App']
{pods}end
"
        )
    }
}

pub const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleDevelopmentRegion</key>
	<string>en</string>
	<key>CFBundleExecutable</key>
	<string>$(EXECUTABLE_NAME)</string>
	<key>CFBundleIdentifier</key>
	<string>com.mockapp.App</string>
	<key>CFBundleInfoDictionaryVersion</key>
	<string>6.0</string>
	<key>CFBundleName</key>
	<string>App</string>
	<key>CFBundlePackageType</key>
	<string>APPL</string>
	<key>CFBundleShortVersionString</key>
	<string>1.0</string>
	<key>CFBundleVersion</key>
	<string>1</string>
	<key>LSRequiresIPhoneOS</key>
	<true/>
	<key>UIRequiredDeviceCapabilities</key>
	<array>
		<string>armv7</string>
	</array>
</dict>
</plist>
"#;

pub const BUCKCONFIG: &str = r"[project]
  ide_force_kill = never

[parser]
  polyglot_parsing_enabled = true
  default_build_file_syntax = SKYLARK

[apple]
  iphonesimulator_target_sdk_version = 12.0
  iphoneos_target_sdk_version = 12.0

[swift]
  version = 5

[alias]
  app = //App:App
";

pub const BAZEL_WORKSPACE: &str = r#"load("@bazel_tools//tools/build_defs/repo:git.bzl", "git_repository")

git_repository(
    name = "build_bazel_rules_apple",
    remote = "https://github.com/bazelbuild/rules_apple.git",
    tag = "0.19.0",
)

load("@build_bazel_rules_apple//apple:repositories.bzl", "apple_rules_dependencies")

apple_rules_dependencies()

load("@build_bazel_rules_swift//swift:repositories.bzl", "swift_rules_dependencies")

swift_rules_dependencies()
"#;
