pub mod sonarqube;

pub use sonarqube::SonarQubeClient;
